// SPDX-License-Identifier: Apache-2.0 OR MIT
fn main() {
    // Wall-clock tests are skipped under `cargo tarpaulin`, which sets
    // `cfg(tarpaulin)`; declare it so normal builds accept the attribute.
    println!("cargo:rustc-check-cfg=cfg(tarpaulin)");
}
