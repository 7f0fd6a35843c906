//! Byte-addressed memory: devices, data segment, stack.

use arch::{error::Error, layout::Layout};

use crate::device::Device;

/// Runtime fault raised inside an instruction, before the faulting line is
/// known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Segfault,
    StackOverflow,
    Unaligned,
    DivideByZero,
    Malformed,
}

impl Fault {
    pub fn at(self, text: &str, line: usize) -> Error {
        match self {
            Fault::Segfault => Error::SegmentationFault(line),
            Fault::StackOverflow => Error::LikelyStackOverflow(line),
            Fault::Unaligned => Error::UnalignedAccess(line),
            Fault::DivideByZero => Error::DivideByZero(line),
            Fault::Malformed => Error::ExecutionFailed(text.to_string(), line),
        }
    }
}

enum Region {
    Data(usize),
    Stack(usize),
}

/// Data and stack segments. This is the view of memory a device gets while it
/// handles an access.
pub struct Segments {
    layout: Layout,
    data: Vec<u8>,
    stack: Vec<u8>,
}

impl Segments {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            data: vec![],
            stack: vec![0; layout.stack_size()],
        }
    }

    /// Little-endian load of `width` bytes.
    pub fn read(&self, addr: u32, width: u32) -> Result<u32, Fault> {
        let bytes = match self.locate(addr, width)? {
            Region::Data(offset) => &self.data[offset..offset + width as usize],
            Region::Stack(offset) => &self.stack[offset..offset + width as usize],
        };
        Ok(bytes
            .iter()
            .rev()
            .fold(0, |acc, byte| (acc << 8) | *byte as u32))
    }

    /// Little-endian store of the low `width` bytes of `value`.
    pub fn write(&mut self, addr: u32, width: u32, value: u32) -> Result<(), Fault> {
        let bytes = match self.locate(addr, width)? {
            Region::Data(offset) => &mut self.data[offset..offset + width as usize],
            Region::Stack(offset) => &mut self.stack[offset..offset + width as usize],
        };
        bytes.copy_from_slice(&value.to_le_bytes()[..width as usize]);
        Ok(())
    }

    /// Word at `addr` without faulting.
    pub fn peek(&self, addr: u32) -> Option<u32> {
        let word = |mem: &[u8], offset: u32| {
            let bytes = mem.get(offset as usize..offset as usize + 4)?;
            Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        };
        if self.layout.in_stack(addr) {
            word(&self.stack, addr - self.layout.stack_base)
        } else {
            word(&self.data, addr.checked_sub(self.layout.data_base)?)
        }
    }

    fn locate(&self, addr: u32, width: u32) -> Result<Region, Fault> {
        if addr % width != 0 {
            return Err(Fault::Unaligned);
        }
        let layout = &self.layout;
        if layout.in_data(addr) {
            let offset = (addr - layout.data_base) as usize;
            return if offset + width as usize <= self.data.len() {
                Ok(Region::Data(offset))
            } else {
                Err(Fault::Segfault)
            };
        }
        if layout.in_stack(addr) {
            return Ok(Region::Stack((addr - layout.stack_base) as usize));
        }
        if layout.in_overflow_band(addr) {
            return Err(Fault::StackOverflow);
        }
        Err(Fault::Segfault)
    }
}

/// Segments plus the devices mapped over them. Devices are consulted first.
pub struct Memory {
    segments: Segments,
    devices: Vec<Box<dyn Device>>,
}

impl Memory {
    pub fn new(layout: Layout) -> Self {
        Self {
            segments: Segments::new(layout),
            devices: vec![],
        }
    }

    pub fn attach(&mut self, mut device: Box<dyn Device>) {
        device.reset();
        self.devices.push(device);
    }

    /// Replace the data image, zero the stack and reset every device.
    pub fn reset(&mut self, mut data: Vec<u8>) {
        // Whole words so aligned accesses never straddle the end
        data.resize(data.len().next_multiple_of(4), 0);
        self.segments.data = data;
        self.segments.stack = vec![0; self.segments.layout.stack_size()];
        for device in &mut self.devices {
            device.reset();
        }
    }

    pub fn update(&mut self) {
        for device in &mut self.devices {
            device.update();
        }
    }

    pub fn read(&mut self, addr: u32, width: u32) -> Result<u32, Fault> {
        match self.device(addr, width)? {
            Some(idx) => self.devices[idx].read(addr, &mut self.segments),
            None => self.segments.read(addr, width),
        }
    }

    pub fn write(&mut self, addr: u32, width: u32, value: u32) -> Result<(), Fault> {
        match self.device(addr, width)? {
            Some(idx) => self.devices[idx].write(addr, value, &mut self.segments),
            None => self.segments.write(addr, width, value),
        }
    }

    /// Word at `addr` without faulting or touching devices.
    pub fn peek(&self, addr: u32) -> Option<u32> {
        self.segments.peek(addr)
    }

    fn device(&self, addr: u32, width: u32) -> Result<Option<usize>, Fault> {
        if addr % width != 0 {
            return Err(Fault::Unaligned);
        }
        Ok(self.devices.iter().position(|dev| dev.maps(addr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Counter;

    fn memory() -> Memory {
        let mut mem = Memory::new(Layout::default());
        mem.reset(vec![0x78, 0x56, 0x34, 0x12, 0xAB]);
        mem
    }

    #[test]
    fn little_endian() {
        let mut mem = memory();
        assert_eq!(mem.read(0x1000_0000, 4), Ok(0x1234_5678));
        assert_eq!(mem.read(0x1000_0002, 2), Ok(0x1234));
        assert_eq!(mem.read(0x1000_0001, 1), Ok(0x56));
        mem.write(0x1000_0000, 1, 0x1FF).unwrap();
        assert_eq!(mem.read(0x1000_0000, 4), Ok(0x1234_56FF));
    }

    #[test]
    fn data_is_padded_to_words() {
        let mut mem = memory();
        assert_eq!(mem.read(0x1000_0004, 4), Ok(0xAB));
        assert_eq!(mem.read(0x1000_0008, 4), Err(Fault::Segfault));
    }

    #[test]
    fn stack_bounds() {
        let mut mem = memory();
        mem.write(0x7FFF_FFFC, 4, 42).unwrap();
        assert_eq!(mem.peek(0x7FFF_FFFC), Some(42));
        assert_eq!(mem.read(0x7FFF_0000, 4), Ok(0));
        assert_eq!(mem.read(0x8000_0000, 4), Err(Fault::Segfault));
        assert_eq!(mem.read(0x7FFE_FFFC, 4), Err(Fault::StackOverflow));
        assert_eq!(mem.read(0x7FFE_FFD8, 4), Err(Fault::StackOverflow));
        assert_eq!(mem.read(0x7FFE_FFD4, 4), Err(Fault::Segfault));
    }

    #[test]
    fn alignment_comes_first() {
        let mut mem = memory();
        assert_eq!(mem.read(0x1000_0002, 4), Err(Fault::Unaligned));
        assert_eq!(mem.write(0x1234_5679, 2, 0), Err(Fault::Unaligned));
        assert_eq!(mem.read(0x1234_5678, 4), Err(Fault::Segfault));
    }

    #[test]
    fn devices_win() {
        let mut mem = memory();
        mem.attach(Box::new(Counter::new(0xFFFF_0000)));
        mem.write(0xFFFF_0000, 4, 3).unwrap();
        mem.update();
        assert_eq!(mem.read(0xFFFF_0000, 4), Ok(2));
        mem.reset(vec![]);
        assert_eq!(mem.read(0xFFFF_0000, 4), Ok(0));
    }

    /// Writes `count` ascending words starting at the stored address.
    struct Fill {
        addr: u32,
        count: u32,
    }

    impl Device for Fill {
        fn maps(&self, addr: u32) -> bool {
            addr == self.addr
        }

        fn read(&mut self, _addr: u32, _mem: &mut Segments) -> Result<u32, Fault> {
            Ok(self.count)
        }

        fn write(&mut self, _addr: u32, value: u32, mem: &mut Segments) -> Result<(), Fault> {
            for i in 0..self.count {
                mem.write(value.wrapping_add(4 * i), 4, i + 1)?;
            }
            Ok(())
        }
    }

    #[test]
    fn device_writes_through_to_data() {
        let mut mem = Memory::new(Layout::default());
        mem.reset(vec![0; 16]);
        mem.attach(Box::new(Fill {
            addr: 0xFFFF_00F0,
            count: 3,
        }));
        assert_eq!(mem.read(0xFFFF_00F0, 4), Ok(3));
        mem.write(0xFFFF_00F0, 4, 0x1000_0004).unwrap();
        assert_eq!(mem.read(0x1000_0000, 4), Ok(0));
        assert_eq!(mem.read(0x1000_0004, 4), Ok(1));
        assert_eq!(mem.read(0x1000_000C, 4), Ok(3));
        assert_eq!(mem.write(0xFFFF_00F0, 4, 0x1000_0008), Err(Fault::Segfault));
    }

    #[test]
    fn reset_clears_stack() {
        let mut mem = memory();
        mem.write(0x7FFF_0010, 4, 9).unwrap();
        mem.reset(vec![]);
        assert_eq!(mem.peek(0x7FFF_0010), Some(0));
    }
}
