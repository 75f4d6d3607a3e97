#[path = "../src/test_support.rs"]
mod test_support;

use std::sync::Arc;

use figment::Jail;
use linktally::config::ConfigOverrides;
use linktally::{
    infallible, ExactComparator, Linkage, LinkageConfig, PairErrorPolicy, PatternCount,
    PatternIndex, Profile, Record, RecordComparator, RecordSchema,
};
use test_support::generate_dataset;

#[test]
fn config_file_drives_linkage_tuning() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "linktally.toml",
            r#"
            profile = "bounded-blocks"

            [tally]
            workers = 2
            max_block_size = 40
            "#,
        )?;
        jail.set_env("LINKTALLY_TALLY__PARALLEL_THRESHOLD", "0");

        let config = LinkageConfig::from_env(Some("linktally.toml")).map_err(|e| e.message)?;
        assert_eq!(config.profile, Profile::BoundedBlocks);

        let dataset = generate_dataset(500, 0.2, 8);
        let comparator: Arc<dyn RecordComparator> =
            Arc::new(ExactComparator::new(dataset.schema).map_err(|e| e.to_string())?);
        let linkage = Linkage::from_config(comparator, &config);

        assert_eq!(linkage.tuning().workers, 2);
        assert_eq!(linkage.tuning().max_block_size, Some(40));
        assert_eq!(linkage.tuning().on_pair_error, PairErrorPolicy::Skip);
        assert!(linkage.tuning().runs_parallel(0));

        let outcome = linkage
            .run(infallible(dataset.records))
            .map_err(|e| e.to_string())?;
        // 500 records over 12 surnames always leaves some block above 40.
        assert!(outcome.blocks_skipped > 0);
        assert_eq!(outcome.tally.total(), outcome.pairs_compared);
        Ok(())
    });
}

#[test]
fn overrides_take_precedence_over_env() {
    Jail::expect_with(|jail| {
        jail.set_env("LINKTALLY_PROFILE", "high-throughput");

        let config = LinkageConfig::load(
            None,
            ConfigOverrides {
                profile: Some(Profile::Sequential),
                tally: None,
            },
        )
        .map_err(|e| e.message)?;
        assert_eq!(config.profile, Profile::Sequential);
        assert!(!config.tuning().runs_parallel(u64::MAX));
        Ok(())
    });
}

#[test]
fn schema_loads_from_json() -> anyhow::Result<()> {
    let schema: RecordSchema = serde_json::from_str(
        r#"{
            "name": "administrative",
            "field_names": ["surname", "given", "birth_year"],
            "blocking_fields": [0, 2]
        }"#,
    )?;
    assert!(!schema.has_id());
    assert_eq!(schema.field_index("birth_year"), Some(2));

    let schema = Arc::new(schema);
    let record = Record::keyed(
        schema.clone(),
        "1",
        "",
        vec!["SMITH".into(), "ANN".into(), 1851_i64.into()],
    )?;
    assert_eq!(record.blocking_key(), "SMITH|#1851");
    Ok(())
}

#[test]
fn tally_exports_as_json_rows() -> anyhow::Result<()> {
    let schema = Arc::new(
        RecordSchema::new("person", vec!["surname".into(), "given".into()], false)
            .with_blocking_fields(vec![0])?,
    );
    let records = vec![
        Record::keyed(schema.clone(), "1", "", vec!["SMITH".into(), "ANN".into()])?,
        Record::keyed(schema.clone(), "2", "", vec!["SMITH".into(), "ANN".into()])?,
        Record::keyed(schema.clone(), "3", "", vec!["SMITH".into(), "MARY".into()])?,
    ];
    let comparator = Arc::new(ExactComparator::new(schema)?);
    let outcome = Linkage::new(comparator, linktally::TallyTuning::sequential())
        .run(infallible(records))?;

    let rows = outcome.tally.to_pattern_counts();
    assert_eq!(
        rows,
        vec![
            PatternCount {
                pattern: PatternIndex(0b01),
                count: 2
            },
            PatternCount {
                pattern: PatternIndex(0b11),
                count: 1
            },
        ]
    );

    let json = serde_json::to_string(&rows)?;
    assert_eq!(json, r#"[{"pattern":1,"count":2},{"pattern":3,"count":1}]"#);
    let parsed: Vec<PatternCount> = serde_json::from_str(&json)?;
    assert_eq!(parsed, rows);
    Ok(())
}
