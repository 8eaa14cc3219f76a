//! Detect and capabilities commands

use smbridge_piix4::chipset::{match_identity, scheme_for};
use smbridge_piix4::regs::SMBIOSIZE;

use crate::adapters::Adapter;

/// Show where the controller is and how it was found
pub fn run_detect(adapter: &Adapter) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = adapter.context();
    let identity = ctx.identity();

    println!("{}", adapter.name());
    match match_identity(identity.vendor_id, identity.device_id, identity.revision_id) {
        Ok(chipset) => println!(
            "  Chipset:   {} {} ({})",
            chipset.vendor_name, chipset.device_name, identity
        ),
        Err(_) => println!("  Chipset:   unknown ({})", identity),
    }
    let scheme = scheme_for(&identity);
    println!(
        "  Discovery: {} PM layout, enable register {:#04x}",
        scheme,
        scheme.selector()
    );
    println!(
        "  Registers: {:#06x}-{:#06x}",
        ctx.base(),
        ctx.base() + SMBIOSIZE - 1
    );

    Ok(())
}

/// Show the functionality mask and the transaction types it covers
pub fn run_capabilities(adapter: &mut Adapter) -> Result<(), Box<dyn std::error::Error>> {
    let caps = adapter.master().functionality();

    println!("Functionality: {:#010x}", caps.bits());
    for kind in caps.kinds() {
        println!("  {}", kind);
    }

    Ok(())
}
