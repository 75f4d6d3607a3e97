use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use linktally::{Field, Record, RecordSchema};

const SURNAMES: [&str; 12] = [
    "SMITH", "JONES", "BROWN", "TAYLOR", "WILSON", "DAVIES", "EVANS", "THOMAS", "JOHNSON",
    "ROBERTS", "WALKER", "WRIGHT",
];
const GIVEN_NAMES: [&str; 10] = [
    "ANN", "JOHN", "MARY", "WILLIAM", "ELIZABETH", "JAMES", "SARAH", "THOMAS", "JANE", "GEORGE",
];
const PARISHES: [&str; 5] = ["ST MARY", "ST JOHN", "HOLY TRINITY", "ALL SAINTS", "ST PETER"];

#[derive(Debug, Clone)]
pub struct GeneratedDataset {
    #[allow(dead_code)]
    pub records: Vec<Record>,
    #[allow(dead_code)]
    pub schema: Arc<RecordSchema>,
}

/// Census-like schema blocked on surname.
#[allow(dead_code)]
pub fn census_schema() -> Arc<RecordSchema> {
    let schema = RecordSchema::new(
        "census",
        vec![
            "surname".to_string(),
            "given".to_string(),
            "birth_year".to_string(),
            "parish".to_string(),
        ],
        true,
    )
    .with_blocking_fields(vec![0])
    .expect("surname is a valid blocking field");
    Arc::new(schema)
}

/// Generate `count` census records. With `duplicate_probability` a record
/// repeats a previously generated person, possibly with a missing or
/// altered field.
#[allow(dead_code)]
pub fn generate_dataset(count: u32, duplicate_probability: f64, seed: u64) -> GeneratedDataset {
    let schema = census_schema();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut people: Vec<Vec<Field>> = Vec::with_capacity(count as usize);
    let mut records = Vec::with_capacity(count as usize);

    for i in 1..=count {
        let fields = if !people.is_empty() && rng.random_bool(duplicate_probability) {
            let mut fields = people[rng.random_range(0..people.len())].clone();
            if rng.random_bool(0.2) {
                fields[3] = Field::Missing;
            }
            if rng.random_bool(0.1) {
                fields[2] = Field::Integer(rng.random_range(1820..1900));
            }
            fields
        } else {
            let fields = vec![
                Field::text(SURNAMES[rng.random_range(0..SURNAMES.len())]),
                Field::text(GIVEN_NAMES[rng.random_range(0..GIVEN_NAMES.len())]),
                Field::Integer(rng.random_range(1820..1900)),
                Field::text(PARISHES[rng.random_range(0..PARISHES.len())]),
            ];
            people.push(fields.clone());
            fields
        };

        let record = Record::keyed(
            schema.clone(),
            format!("{:06}", i),
            format!("person_{:06}", i),
            fields,
        )
        .expect("generated record matches schema");
        records.push(record);
    }

    GeneratedDataset { records, schema }
}

/// Install a fmt subscriber once per test binary. Honors `RUST_LOG`.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
