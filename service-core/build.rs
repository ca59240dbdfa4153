use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto_root = PathBuf::from("../proto");

    // Use the bundled protoc so builds do not depend on a system install
    let protoc = protoc_bin_vendored::protoc_bin_path()?;
    // SAFETY: build scripts are single-threaded.
    unsafe {
        std::env::set_var("PROTOC", protoc);
    }

    println!("cargo:rerun-if-changed=../proto/crm/user/v1/");
    println!("cargo:rerun-if-changed=../proto/crm/product/v1/");
    println!("cargo:rerun-if-changed=../proto/crm/company/v1/");
    println!("cargo:rerun-if-changed=../proto/crm/debt/v1/");

    // Client-side stubs only; the gateway never serves these services.
    // Messages double as JSON bodies, so they carry serde derives.
    tonic_build::configure()
        .build_server(false)
        .build_client(true)
        .type_attribute(
            ".",
            "#[derive(serde::Serialize, serde::Deserialize)] #[serde(default)]",
        )
        .compile_protos(
            &[
                "../proto/crm/user/v1/user.proto",
                "../proto/crm/product/v1/product.proto",
                "../proto/crm/company/v1/company.proto",
                "../proto/crm/debt/v1/debt.proto",
            ],
            &[&proto_root],
        )?;

    Ok(())
}
