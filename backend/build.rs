use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Tell Cargo to rerun this build script if the proto file changes
    let proto_file = "proto/settlement.proto";
    println!("cargo:rerun-if-changed={}", proto_file);

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(out_dir.join("settlement_descriptor.bin"))
        .compile(&[proto_file], &["proto"])?;

    Ok(())
}
