//! Port I/O backend trait

use core::fmt;

/// Byte-wide port I/O with microsecond delays
///
/// Accesses are immediate and unbuffered: every call must reach the
/// hardware (or the emulator) in program order. Ports that cannot be
/// accessed read as `0xff`, like an undecoded port on the LPC bus.
pub trait PortIo {
    /// Read one byte from `port`
    fn read_u8(&mut self, port: u16) -> u8;

    /// Write one byte to `port`
    fn write_u8(&mut self, port: u16, value: u8);

    /// Delay for at least the specified number of microseconds
    fn delay_us(&mut self, us: u32);
}

impl<T: PortIo + ?Sized> PortIo for &mut T {
    fn read_u8(&mut self, port: u16) -> u8 {
        (**self).read_u8(port)
    }

    fn write_u8(&mut self, port: u16, value: u8) {
        (**self).write_u8(port, value)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

#[cfg(feature = "alloc")]
impl<T: PortIo + ?Sized> PortIo for alloc::boxed::Box<T> {
    fn read_u8(&mut self, port: u16) -> u8 {
        (**self).read_u8(port)
    }

    fn write_u8(&mut self, port: u16, value: u8) {
        (**self).write_u8(port, value)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

/// A contiguous range of I/O ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IoRegion {
    /// First port in the range
    pub start: u16,
    /// Number of ports
    pub len: u16,
}

impl IoRegion {
    /// Create a region
    pub const fn new(start: u16, len: u16) -> Self {
        Self { start, len }
    }

    /// One past the last port, widened so `0xffff + 1` does not wrap
    pub const fn end(&self) -> u32 {
        self.start as u32 + self.len as u32
    }

    /// Returns true if the two ranges share at least one port
    pub const fn overlaps(&self, other: &IoRegion) -> bool {
        (self.start as u32) < other.end() && (other.start as u32) < self.end()
    }

    /// Returns true if `port` lies inside the range
    pub const fn contains(&self, port: u16) -> bool {
        (port as u32) >= self.start as u32 && (port as u32) < self.end()
    }
}

impl fmt::Display for IoRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len == 0 {
            return write!(f, "{:04x}-(empty)", self.start);
        }
        write!(f, "{:04x}-{:04x}", self.start, self.end() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap() {
        let pair = IoRegion::new(0xcd6, 2);
        assert!(pair.overlaps(&IoRegion::new(0xcd7, 1)));
        assert!(pair.overlaps(&IoRegion::new(0xcd0, 8)));
        assert!(!pair.overlaps(&IoRegion::new(0xcd8, 4)));
        assert!(!pair.overlaps(&IoRegion::new(0xcd0, 6)));
    }

    #[test]
    fn test_top_of_space() {
        let region = IoRegion::new(0xfff8, 8);
        assert_eq!(region.end(), 0x10000);
        assert!(region.contains(0xffff));
    }

    #[test]
    fn test_empty_region_overlaps_nothing() {
        let empty = IoRegion::new(0xb00, 0);
        assert!(!empty.overlaps(&IoRegion::new(0xb00, 8)));
    }
}
