fn main() {
    // A fixed BLE address is baked into the binary at compile time.
    println!("cargo:rerun-if-env-changed=SOILBEACON_BLE_ADDR");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
