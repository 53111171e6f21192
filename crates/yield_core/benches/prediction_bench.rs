use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cropcast_core::gbdt::{Model, Node, Tree, SCALE};
use cropcast_core::{
    predict, CategorySchema, EmptyHistory, FeatureAssembler, NumericMeans, Selection, YieldRecord,
};

const COUNTRIES: usize = 100;
const CROPS: usize = 10;

fn schema() -> CategorySchema {
    CategorySchema::new(
        (0..COUNTRIES).map(|i| format!("Country{i:03}")),
        (0..CROPS).map(|i| format!("Crop{i:02}")),
    )
}

fn feature_names(schema: &CategorySchema) -> Vec<String> {
    let mut names: Vec<String> = [
        "Year",
        "average_rain_fall_mm_per_year",
        "pesticides_tonnes",
        "avg_temp",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    names.extend(schema.area_columns());
    names.extend(schema.item_columns());
    names
}

fn sample_model(names: Vec<String>) -> Model {
    // One stump per numeric feature, roughly the shape of a shallow booster
    let trees = (0..4)
        .map(|f| {
            Tree::new(
                vec![
                    Node::internal(0, f, 1_000 * SCALE, 1, 2),
                    Node::leaf(1, 10_000 * SCALE),
                    Node::leaf(2, 20_000 * SCALE),
                ],
                SCALE,
            )
        })
        .collect();
    Model::new(trees, 0, names)
}

fn history() -> Vec<YieldRecord> {
    (1990..=2013)
        .map(|year| YieldRecord {
            year,
            country: "Country042".to_string(),
            crop: "Crop03".to_string(),
            rainfall_mm: 1200.0,
            pesticides_tonnes: 3_500.0,
            avg_temp: 19.0,
            yield_hg_ha: 45_000.0,
        })
        .collect()
}

fn bench_assemble_and_predict(c: &mut Criterion) {
    let schema = schema();
    let names = feature_names(&schema);
    let model = sample_model(names.clone());
    let global = NumericMeans::ZERO;
    let assembler = FeatureAssembler::new(&schema, &names, EmptyHistory::Reject, &global);
    let rows = history();
    let history: Vec<&YieldRecord> = rows.iter().collect();
    let selection = Selection::new("Country042", "Crop03", 1990, 2013);

    c.bench_function("assemble_feature_vector", |b| {
        b.iter(|| {
            let vector = assembler.assemble(black_box(&history), &selection, 2014);
            black_box(vector)
        });
    });

    let vector = assembler.assemble(&history, &selection, 2014).unwrap();
    c.bench_function("predict_single_row", |b| {
        b.iter(|| black_box(predict(&model, black_box(&vector))));
    });
}

criterion_group!(prediction_benches, bench_assemble_and_predict);
criterion_main!(prediction_benches);
