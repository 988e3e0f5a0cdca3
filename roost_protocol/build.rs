use std::{env, io::Result, path::PathBuf, println};

static STORAGE_DESCRIPTOR_FILE: &str = "roost_v1_storage.bin";

fn main() -> Result<()> {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    println!("cargo:rerun-if-changed=proto");

    tonic_build::configure()
        .build_client(true)
        .build_server(true)
        .file_descriptor_set_path(out_dir.join(STORAGE_DESCRIPTOR_FILE))
        .compile_protos(&["proto/roost/v1/storage.proto"], &["proto/"])?;

    Ok(())
}
