use minijinja::{Environment, context};
use std::fs;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
struct TypeInfo {
    name: String,
    #[serde(default)]
    rust: Option<String>,
    size: usize,
}

#[derive(Debug, Deserialize, Serialize)]
struct TypeList {
    types: Vec<TypeInfo>,
}

fn main() {
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap());
    let yaml_path = manifest_dir.join("../supported_types.yaml");
    let template_path = manifest_dir.join("templates/data_types.jinja");
    let out_path = manifest_dir.join("src/generated_data_types.rs");

    let yaml_str = fs::read_to_string(&yaml_path)
        .expect("Unable to read supported_types.yaml");
    let type_list: TypeList = serde_yaml::from_str(&yaml_str)
        .expect("Failed to parse YAML");

    let template_source = fs::read_to_string(&template_path)
        .expect("Unable to read template file");

    let env = Environment::new();
    let tmpl = env.template_from_str(&template_source).unwrap();
    let rendered = tmpl.render(context! { types => type_list.types }).unwrap();

    // Leave the checked-in file alone when nothing changed
    if fs::read_to_string(&out_path).ok().as_deref() != Some(rendered.as_str()) {
        fs::write(&out_path, rendered)
            .expect("Unable to write generated file");
    }

    println!("cargo:rerun-if-changed={}", yaml_path.display());
    println!("cargo:rerun-if-changed={}", template_path.display());
}
