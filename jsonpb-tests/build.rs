use std::path::PathBuf;

use jsonpb_codegen::{CodegenBuilder, Mode, RuntimeConfig};

fn main() {
    // Generate code for integration tests
    // Every fixture is rewritten in place into OUT_DIR from the
    // [package.metadata.jsonpb-codegen] section of Cargo.toml
    let written = jsonpb_codegen::generate_from_cargo_metadata().expect("codegen failed");
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());

    for source in &written {
        let name = source.file_name().unwrap();
        let fixture = PathBuf::from("testdata").join(name);

        // Companion files, both runtimes
        CodegenBuilder::new(&fixture)
            .mode(Mode::Template)
            .destination(out_dir.join("template").join(name))
            .generate()
            .expect("template codegen failed");
        CodegenBuilder::new(&fixture)
            .mode(Mode::Template)
            .runtime(RuntimeConfig::jsonpb())
            .destination(out_dir.join("template-jsonpb").join(name))
            .generate()
            .expect("template codegen failed");

        // In-place again over the first pass output
        CodegenBuilder::new(source)
            .destination(out_dir.join("second-pass").join(name))
            .generate()
            .expect("second pass failed");
        CodegenBuilder::new(source)
            .skip_existing()
            .destination(out_dir.join("second-pass-skip").join(name))
            .generate()
            .expect("second pass failed");
    }

    CodegenBuilder::new("testdata/already_defined.pb.go")
        .skip_existing()
        .destination(out_dir.join("skip-existing").join("already_defined.pb.go"))
        .generate()
        .expect("codegen failed");

    println!("cargo:rerun-if-changed=testdata");
}
