//! In-memory shading stage for headless runs and tests.

use std::collections::HashMap;

use log::debug;

use super::{BufferDevice, DeviceError, ParamSink};

/// Buffer living in host memory
#[derive(Debug)]
pub struct HostBuffer {
    id: u64,
    size: u64,
}

impl HostBuffer {
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Host-memory stand-in for a GPU device and material
#[derive(Debug, Default)]
pub struct HostBackend {
    next_id: u64,
    buffers: HashMap<u64, Vec<u8>>,
    bindings: HashMap<String, u64>,
    ints: HashMap<String, i32>,
    floats: HashMap<String, f32>,
    keywords: HashMap<String, bool>,
    /// Total bytes that may be live at once (None = unlimited)
    memory_limit: Option<u64>,
    /// Declared buffer slots (None = any slot)
    slots: Option<Vec<String>>,
    write_count: usize,
}

impl HostBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail allocations that would push live memory past `bytes`
    pub fn with_memory_limit(bytes: u64) -> Self {
        Self {
            memory_limit: Some(bytes),
            ..Self::default()
        }
    }

    /// Accept bindings only under the listed slots
    pub fn with_slots(slots: &[&str]) -> Self {
        Self {
            slots: Some(slots.iter().map(|s| s.to_string()).collect()),
            ..Self::default()
        }
    }

    /// Contents of the buffer bound under `slot`
    pub fn bound_bytes(&self, slot: &str) -> Option<&[u8]> {
        let id = self.bindings.get(slot)?;
        self.buffers.get(id).map(Vec::as_slice)
    }

    /// Contents of `buffer` (None once destroyed)
    pub fn buffer_bytes(&self, buffer: &HostBuffer) -> Option<&[u8]> {
        self.buffers.get(&buffer.id).map(Vec::as_slice)
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        self.ints.get(name).copied()
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        self.floats.get(name).copied()
    }

    pub fn keyword(&self, name: &str) -> Option<bool> {
        self.keywords.get(name).copied()
    }

    /// Number of buffers not yet destroyed
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Number of `write_buffer` calls so far
    pub fn write_count(&self) -> usize {
        self.write_count
    }

    fn live_bytes(&self) -> u64 {
        self.buffers.values().map(|b| b.len() as u64).sum()
    }
}

impl BufferDevice for HostBackend {
    type Buffer = HostBuffer;

    fn create_buffer(&mut self, label: &str, size: u64) -> Result<HostBuffer, DeviceError> {
        if size == 0 {
            return Err(DeviceError::ZeroSized);
        }
        let out_of_memory = DeviceError::OutOfMemory { requested: size };
        let total = self
            .live_bytes()
            .checked_add(size)
            .ok_or(out_of_memory.clone())?;
        if self.memory_limit.is_some_and(|limit| total > limit) {
            return Err(out_of_memory);
        }

        let len = usize::try_from(size).map_err(|_| out_of_memory.clone())?;
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(len)
            .map_err(|_| out_of_memory)?;
        bytes.resize(len, 0);

        self.next_id += 1;
        let id = self.next_id;
        self.buffers.insert(id, bytes);
        debug!("Host buffer '{}' #{} created ({} bytes)", label, id, size);

        Ok(HostBuffer { id, size })
    }

    fn write_buffer(&mut self, buffer: &HostBuffer, offset: u64, data: &[u8]) {
        let Some(bytes) = self.buffers.get_mut(&buffer.id) else {
            return;
        };
        let start = offset as usize;
        let end = (start + data.len()).min(bytes.len());
        if start < end {
            bytes[start..end].copy_from_slice(&data[..end - start]);
        }
        self.write_count += 1;
    }

    fn bind_buffer(&mut self, slot: &str, buffer: &HostBuffer) -> Result<(), DeviceError> {
        if let Some(slots) = &self.slots {
            if !slots.iter().any(|s| s == slot) {
                return Err(DeviceError::UnknownSlot(slot.to_string()));
            }
        }
        self.bindings.insert(slot.to_string(), buffer.id);
        Ok(())
    }

    fn unbind_buffer(&mut self, slot: &str) {
        self.bindings.remove(slot);
    }

    fn destroy_buffer(&mut self, buffer: HostBuffer) {
        self.buffers.remove(&buffer.id);
        self.bindings.retain(|_, id| *id != buffer.id);
    }
}

impl ParamSink for HostBackend {
    fn set_int(&mut self, name: &str, value: i32) {
        self.ints.insert(name.to_string(), value);
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.floats.insert(name.to_string(), value);
    }

    fn set_keyword(&mut self, name: &str, enabled: bool) {
        self.keywords.insert(name.to_string(), enabled);
    }
}
