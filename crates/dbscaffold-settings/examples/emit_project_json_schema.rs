use dbscaffold_settings::project_json_schema;

fn main() {
    let schema = project_json_schema();
    let json = serde_json::to_string_pretty(&schema).expect("serialize project json schema");
    println!("{json}");
}
