//! Adapter registration and dispatch
//!
//! Every adapter is a [`Piix4Controller`] over some port backend: the
//! system's `/dev/port` for `piix4`, the register-level emulator for
//! `dummy`. Adapters are feature-gated the same way in the registry and in
//! [`open_adapter`].

use smbridge_core::master::SmbusMaster;
use smbridge_piix4::{Context, Piix4Controller, TransactionReport};

/// Information about an adapter
pub struct AdapterInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// All adapters enabled at compile time
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_adapters() -> Vec<AdapterInfo> {
    let mut adapters = Vec::new();

    #[cfg(feature = "piix4")]
    adapters.push(AdapterInfo {
        name: "piix4",
        aliases: &["sb800", "kerncz"],
        description: "AMD SB800/FCH SMBus host via /dev/port (dev=,lock=file|process,lockdir=) - requires root",
    });

    #[cfg(feature = "dummy")]
    adapters.push(AdapterInfo {
        name: "dummy",
        aliases: &["emulator"],
        description: "Emulated SB800 controller with one memory-like device (addr=<hex>)",
    });

    adapters
}

/// Help text listing all available adapters
pub fn adapter_help() -> String {
    let adapters = available_adapters();

    if adapters.is_empty() {
        return "No adapters available (recompile with adapter features enabled)".to_string();
    }

    let mut help = String::from("Available adapters:\n");
    for a in &adapters {
        help.push_str(&format!("  {:8} - {}\n", a.name, a.description));
    }
    help
}

/// Canonical name for `name` or one of its aliases
pub fn find_adapter(name: &str) -> Option<&'static str> {
    available_adapters()
        .into_iter()
        .find(|a| a.name == name || a.aliases.contains(&name))
        .map(|a| a.name)
}

/// Parse an adapter string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_adapter_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

/// An opened adapter
pub enum Adapter {
    /// Hardware controller behind /dev/port
    #[cfg(feature = "piix4")]
    Piix4(Piix4Controller<smbridge_piix4::DevPort>),
    /// Emulated controller
    #[cfg(feature = "dummy")]
    Dummy(Piix4Controller<smbridge_dummy::Piix4Emulator>),
}

impl Adapter {
    /// The bus interface
    pub fn master(&mut self) -> &mut dyn SmbusMaster {
        match self {
            #[cfg(feature = "piix4")]
            Adapter::Piix4(c) => c,
            #[cfg(feature = "dummy")]
            Adapter::Dummy(c) => c,
        }
    }

    /// Controller context (base address, identity)
    pub fn context(&self) -> &Context {
        match self {
            #[cfg(feature = "piix4")]
            Adapter::Piix4(c) => c.context(),
            #[cfg(feature = "dummy")]
            Adapter::Dummy(c) => c.context(),
        }
    }

    /// Adapter name as the kernel would print it
    pub fn name(&self) -> String {
        match self {
            #[cfg(feature = "piix4")]
            Adapter::Piix4(c) => c.name().to_string(),
            #[cfg(feature = "dummy")]
            Adapter::Dummy(c) => c.name().to_string(),
        }
    }

    /// Report of the most recent transaction
    pub fn last_report(&self) -> Option<&TransactionReport> {
        match self {
            #[cfg(feature = "piix4")]
            Adapter::Piix4(c) => c.last_report(),
            #[cfg(feature = "dummy")]
            Adapter::Dummy(c) => c.last_report(),
        }
    }

    /// Tear the controller down
    pub fn close(self) {
        match self {
            #[cfg(feature = "piix4")]
            Adapter::Piix4(c) => drop(c.destroy()),
            #[cfg(feature = "dummy")]
            Adapter::Dummy(c) => drop(c.destroy()),
        }
    }
}

/// Open the adapter named by `spec`
///
/// The spec can be just the name (e.g. "piix4") or include options (e.g.
/// "piix4:lock=process").
#[allow(unused_variables)]
pub fn open_adapter(spec: &str) -> Result<Adapter, Box<dyn std::error::Error>> {
    let (name, options) = parse_adapter_string(spec);

    let canonical = match find_adapter(name) {
        Some(n) => n,
        None => return Err(unknown_adapter_error(name)),
    };

    match canonical {
        #[cfg(feature = "piix4")]
        "piix4" => {
            use smbridge_piix4::{open_piix4, Piix4Options};

            let opts = Piix4Options::from_options(&options)
                .map_err(|e| format!("Invalid piix4 parameters: {}", e))?;

            log::info!("Opening PIIX4 SMBus adapter...");
            let ctrl = open_piix4(&opts).map_err(|e| {
                format!(
                    "Failed to open PIIX4 adapter: {}\n\
                     Make sure you have root privileges and an AMD SB800-family chipset.",
                    e
                )
            })?;
            Ok(Adapter::Piix4(ctrl))
        }

        #[cfg(feature = "dummy")]
        "dummy" => Ok(Adapter::Dummy(dummy::open(&options)?)),

        _ => Err(unknown_adapter_error(name)),
    }
}

#[cfg(feature = "dummy")]
mod dummy {
    use smbridge_core::platform::{NoReservations, RegionTable};
    use smbridge_dummy::{Piix4Emulator, DEFAULT_DEVICE};
    use smbridge_piix4::{ControllerIdentity, Piix4Controller};

    use crate::cli::parse_address;

    /// Identity reported for the emulated controller (KERNCZ, new PM layout)
    pub const IDENTITY: ControllerIdentity = ControllerIdentity::new(0x1022, 0x790b, 0x51);

    /// Device identification string served from block command 0
    const ID_BLOCK: &[u8] = b"smbridge-dummy";

    pub fn open(
        options: &[(&str, &str)],
    ) -> Result<Piix4Controller<Piix4Emulator>, Box<dyn std::error::Error>> {
        let mut addr = DEFAULT_DEVICE;
        for (key, value) in options {
            match *key {
                "addr" => {
                    addr = parse_address(value)
                        .map_err(|e| format!("Invalid dummy parameters: {}", e))?
                }
                _ => log::warn!("dummy: Unknown option: {}={}", key, value),
            }
        }

        let mut emu = Piix4Emulator::new();
        emu.remove_device(DEFAULT_DEVICE);
        let device = emu.add_device(addr);
        for reg in 0..=255u8 {
            device.set_register(reg, reg);
        }
        device.set_block(0, ID_BLOCK);

        log::info!("Using emulated controller, device at {:#04x}", addr);
        let table = RegionTable::new();
        Ok(Piix4Controller::create(emu, &table, &NoReservations, IDENTITY)?)
    }
}

fn unknown_adapter_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown adapter: {}\n\n", name);
    msg.push_str(&adapter_help());
    msg.push_str("\nUse 'smbridge list-adapters' for more details");
    msg.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_adapter_string() {
        assert_eq!(parse_adapter_string("piix4"), ("piix4", vec![]));
        assert_eq!(
            parse_adapter_string("piix4:lock=process,dev=/tmp/port"),
            ("piix4", vec![("lock", "process"), ("dev", "/tmp/port")])
        );
        // Entries without '=' are dropped
        assert_eq!(
            parse_adapter_string("dummy:addr=0x20,junk"),
            ("dummy", vec![("addr", "0x20")])
        );
    }

    #[test]
    fn test_unknown_adapter() {
        assert!(find_adapter("ch341a").is_none());
        assert!(open_adapter("ch341a").is_err());
    }

    #[cfg(feature = "dummy")]
    mod dummy_adapter {
        use super::super::*;
        use smbridge_core::smbus::SlaveAddress;
        use smbridge_core::Error;

        #[test]
        fn test_alias() {
            assert_eq!(find_adapter("emulator"), Some("dummy"));
        }

        #[test]
        fn test_open_default() {
            let mut adapter = open_adapter("dummy").unwrap();
            assert_eq!(adapter.context().base(), 0x0b20);
            assert_eq!(adapter.name(), "SMBus PIIX4 adapter at 0b20");

            let addr = SlaveAddress::new(0x50).unwrap();
            assert_eq!(adapter.master().read_byte_data(addr, 0x12).unwrap(), 0x12);
            assert_eq!(
                adapter.master().read_block_data(addr, 0).unwrap().as_slice(),
                b"smbridge-dummy"
            );
            assert!(adapter.last_report().is_some());
            adapter.close();
        }

        #[test]
        fn test_open_with_addr() {
            let mut adapter = open_adapter("dummy:addr=0x2c").unwrap();
            let moved = SlaveAddress::new(0x2c).unwrap();
            let old = SlaveAddress::new(0x50).unwrap();
            assert!(adapter.master().read_byte(moved).is_ok());
            assert_eq!(adapter.master().read_byte(old), Err(Error::DeviceNotFound));
        }

        #[test]
        fn test_bad_addr() {
            assert!(open_adapter("dummy:addr=0x90").is_err());
        }
    }
}
