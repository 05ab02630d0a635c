/// Tests for the merge and optimisation steps against real reference files
mod common;

use biorempp::bio::sample_input::parse;
use biorempp::core::catalog::ReferenceTable;
use biorempp::core::database::Database;
use biorempp::core::frame::{ColumnKind, FrameBuilder};
use biorempp::core::merger::merge;
use biorempp::core::optimizer::TypeOptimizer;
use biorempp::error::CatalogErrorKind;
use common::ReferenceFixture;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::path::Path;

#[test]
fn test_scenario_against_every_database() {
    let fixture = ReferenceFixture::new();
    let catalog = fixture.catalog();
    let (records, _) = parse(common::SCENARIO_INPUT).unwrap();

    let expected = [
        (Database::BioRemPP, 5),
        (Database::Kegg, 5),
        (Database::Hadeg, 2),
        (Database::ToxCsm, 4),
    ];
    for (database, matches) in expected {
        let result = merge(&records, catalog.get(database).unwrap());
        assert_eq!(result.match_count, matches, "{}", database);
        assert_eq!(result.input_gene_count, 3);
    }
}

#[test]
fn test_joined_rows_follow_input_then_table_order() {
    let fixture = ReferenceFixture::new();
    let catalog = fixture.catalog();
    let (records, _) = parse(common::SCENARIO_INPUT).unwrap();

    let result = merge(&records, catalog.get(Database::Kegg).unwrap());
    let rows: Vec<Vec<String>> = result
        .frame
        .rows()
        .map(|row| row.into_iter().map(|c| c.into_owned()).collect())
        .collect();
    assert_eq!(
        rows,
        vec![
            vec!["S1", "K00031", "Benzoate degradation", "IDH1"],
            vec!["S1", "K00031", "Toluene degradation", "IDH1"],
            vec!["S2", "K00031", "Benzoate degradation", "IDH1"],
            vec!["S2", "K00031", "Toluene degradation", "IDH1"],
            vec!["S2", "K00032", "Xylene degradation", "IDH2"],
        ]
    );
}

#[test]
fn test_extra_reference_columns_are_kept() {
    let fixture = ReferenceFixture::new();
    let catalog = fixture.catalog();
    let (records, _) = parse(">S1\nK00032\n").unwrap();

    let result = merge(&records, catalog.get(Database::ToxCsm).unwrap());
    assert_eq!(
        result.frame.names(),
        &["sample", "ko", "SMILES", "cpd", "ChEBI", "compoundname", "value_NR_AR", "label_NR_AR"]
    );
    assert_eq!(result.frame.row(1)[5], "benzene");
}

#[test]
fn test_schema_mismatch_is_reported_per_database() {
    let fixture = ReferenceFixture::new();
    fixture.write(Database::Hadeg, "Gene;ko;Pathway\nalkB;K00031;Alkanes\n");

    let catalog = fixture.catalog();
    assert_eq!(
        catalog.get(Database::Hadeg).unwrap_err().kind(),
        CatalogErrorKind::SchemaMismatch
    );
    assert!(catalog.get(Database::Kegg).is_ok());
}

#[test]
fn test_optimizer_on_toxcsm_result() {
    let fixture = ReferenceFixture::new();
    let catalog = fixture.catalog();
    let input = ">S1\nK00031\nK00032\n>S2\nK00032\n>S3\nK00031\nK00032\n";
    let (records, _) = parse(input).unwrap();

    let merged = merge(&records, catalog.get(Database::ToxCsm).unwrap());
    let original = merged.frame.clone();
    let optimized = TypeOptimizer::default().optimize(merged);

    assert!(optimized.frame.same_values(&original));
    let memory = optimized.memory.unwrap();
    assert!(memory.bytes_after <= memory.bytes_before);
    assert_eq!(
        optimized.frame.column("ko").unwrap().kind(),
        ColumnKind::Categorical
    );
    assert_eq!(
        optimized.frame.column("ChEBI").unwrap().kind(),
        ColumnKind::Int16
    );
}

fn table_with_fanout(fanout: usize) -> ReferenceTable {
    let mut data = String::from("ko;pathname;genesymbol\n");
    for i in 0..fanout {
        data.push_str(&format!("K00001;Pathway {};GENE\n", i));
    }
    data.push_str("K00002;Other;OTHER\n");
    ReferenceTable::from_reader(Database::Kegg, data.as_bytes(), b';', Path::new("generated"))
        .unwrap()
}

fn arb_cell() -> impl Strategy<Value = String> {
    prop_oneof![
        (-200i64..200).prop_map(|n| n.to_string()),
        (-1_000_000i64..1_000_000).prop_map(|n| n.to_string()),
        (0u32..1000, 0u32..100).prop_map(|(a, b)| format!("{}.{}", a, b)),
        prop::sample::select(vec!["Safe", "Toxic", "High Toxicity", ""]).prop_map(String::from),
        "[a-zA-Z0-9 ;\"]{0,12}",
    ]
}

proptest! {
    #[test]
    fn prop_join_cardinality(fanout in 1usize..25, copies in 1usize..4) {
        let table = table_with_fanout(fanout);
        let mut input = String::new();
        for s in 0..copies {
            input.push_str(&format!(">S{}\nK00001\nK99999\n", s));
        }
        let (records, _) = parse(&input).unwrap();

        let result = merge(&records, &table);
        prop_assert_eq!(result.match_count, fanout * copies);
        prop_assert_eq!(result.input_gene_count, 2 * copies);
        prop_assert_eq!(result.unique_genes_matched, 1);
    }

    #[test]
    fn prop_optimizer_is_transparent(
        rows in prop::collection::vec(prop::collection::vec(arb_cell(), 3), 0..40),
        uniform in prop::collection::vec(-50i64..50, 0..40),
    ) {
        let mut builder = FrameBuilder::new(vec![
            "a".to_string(), "b".to_string(), "c".to_string(), "n".to_string(),
        ]);
        for (idx, row) in rows.iter().enumerate() {
            let n = uniform.get(idx).map(|v| v.to_string()).unwrap_or_default();
            builder.push_row([row[0].as_str(), row[1].as_str(), row[2].as_str(), n.as_str()]);
        }
        let frame = builder.finish();

        let (optimized, _) = TypeOptimizer::default().optimize_frame(frame.clone());
        prop_assert!(optimized.same_values(&frame));
        prop_assert!(optimized.estimated_bytes() <= frame.estimated_bytes());
    }
}
