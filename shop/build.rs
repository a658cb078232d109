use common::yaml_include::load_yaml_with_includes;
use std::{error::Error, fs, io::Write, path::Path};

fn main() -> Result<(), Box<dyn Error>> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")?;
    let source_config_dir = Path::new(&manifest_dir).join("config");
    println!("cargo:rerun-if-changed={}", source_config_dir.display());
    println!("cargo:rerun-if-env-changed=SHOP_ENV");

    let out_dir = std::env::var("OUT_DIR")?;
    let env = std::env::var("SHOP_ENV").unwrap_or_else(|_| "dev".to_string());
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "debug".to_string());

    // OUT_DIR lives under target/<profile>/build/...; the bundle goes next to the binaries
    let target_dir = Path::new(&out_dir)
        .ancestors()
        .find(|p| p.ends_with(&profile))
        .ok_or("Could not find target profile directory")?
        .to_path_buf();

    let total_config_dir = target_dir.join("config");
    let total_config_file_name = total_config_dir.join("total_config.yaml");

    let config_yaml = load_yaml_with_includes(&source_config_dir.join(format!("{}.yaml", env)))?;

    let mut out_str = String::new();
    {
        let mut emitter = yaml_rust2::YamlEmitter::new(&mut out_str);
        emitter.dump(&config_yaml)?;
    }

    println!(
        "cargo:warning=Writing {} config to {:?}",
        env, total_config_file_name
    );

    fs::create_dir_all(total_config_dir)?;
    fs::File::create(total_config_file_name)?.write_all(out_str.as_bytes())?;

    Ok(())
}
