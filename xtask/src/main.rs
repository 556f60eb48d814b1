#![deny(unused_must_use)]

use std::{env, path::PathBuf};

use xshell::cmd;

const EMBEDDED_TARGET: &str = "thumbv7em-none-eabihf";

fn main() -> Result<(), anyhow::Error> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    let args = args.iter().map(|s| &**s).collect::<Vec<_>>();

    match &args[..] {
        ["ci"] => test_ci(),
        ["test"] => test_device(),
        ["check"] => check_embedded(),
        ["update"] => update(),
        _ => {
            println!("USAGE cargo xtask [ci|test|check|update]");
            Ok(())
        }
    }
}

fn update() -> Result<(), anyhow::Error> {
    let _p = xshell::pushd(root_dir())?;
    cmd!("cargo update").run()?;
    Ok(())
}

fn test_ci() -> Result<(), anyhow::Error> {
    let _e = xshell::pushenv("CI", "true");
    test_device()?;
    check_embedded()?;
    Ok(())
}

fn test_device() -> Result<(), anyhow::Error> {
    let _p = xshell::pushd(device_dir())?;
    cmd!("cargo test --features 'std log'").run()?;
    Ok(())
}

/// The driver must keep building without std, with either logging backend or none.
fn check_embedded() -> Result<(), anyhow::Error> {
    let _p = xshell::pushd(device_dir())?;
    let target = EMBEDDED_TARGET;
    cmd!("cargo check --no-default-features --target {target}").run()?;
    cmd!("cargo check --no-default-features --features log --target {target}").run()?;
    cmd!("cargo check --no-default-features --features defmt --target {target}").run()?;
    Ok(())
}

fn device_dir() -> PathBuf {
    let mut device = root_dir();
    device.push("device");
    device
}

fn root_dir() -> PathBuf {
    let mut xtask_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    xtask_dir.pop();
    xtask_dir
}
