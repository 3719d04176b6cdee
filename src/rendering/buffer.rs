//! Fixed-capacity wave buffer with allocate-once / release-once discipline.

use std::fmt;

use bytemuck::Pod;
use log::{debug, warn};

use super::{param_names, BufferDevice, DeviceError};
use crate::error::WaveError;

/// Identifies one allocation. Stale after `BufferManager::release`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(u64);

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Allocation<B> {
    handle: BufferHandle,
    buffer: B,
    capacity: usize,
    stride: usize,
    /// Slots this buffer is currently bound to
    slots: Vec<String>,
}

/// Owns at most one GPU-visible record array
pub struct BufferManager<D: BufferDevice> {
    device: D,
    live: Option<Allocation<D::Buffer>>,
    next_id: u64,
}

impl<D: BufferDevice> BufferManager<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            live: None,
            next_id: 1,
        }
    }

    /// Allocate `capacity` records of `stride` bytes, unless a buffer
    /// already exists. New buffers are bound to the wave slot.
    pub fn ensure_allocated(
        &mut self,
        capacity: usize,
        stride: usize,
    ) -> Result<BufferHandle, WaveError> {
        if let Some(live) = &self.live {
            if live.capacity != capacity || live.stride != stride {
                warn!(
                    "Wave buffer {} already allocated as {}x{}B, ignoring request for {}x{}B",
                    live.handle, live.capacity, live.stride, capacity, stride
                );
            }
            return Ok(live.handle);
        }

        if capacity == 0 || stride == 0 {
            return Err(DeviceError::ZeroSized.into());
        }

        let size = (capacity as u64)
            .checked_mul(stride as u64)
            .ok_or(DeviceError::OutOfMemory { requested: u64::MAX })?;
        let buffer = self.device.create_buffer("Wave Buffer", size)?;

        let handle = BufferHandle(self.next_id);
        self.next_id += 1;

        if let Err(err) = self.device.bind_buffer(param_names::WAVES, &buffer) {
            self.device.destroy_buffer(buffer);
            return Err(err.into());
        }
        debug!(
            "Allocated wave buffer {} ({} records x {} bytes)",
            handle, capacity, stride
        );

        self.live = Some(Allocation {
            handle,
            buffer,
            capacity,
            stride,
            slots: vec![param_names::WAVES.to_string()],
        });

        Ok(handle)
    }

    /// Write `records` to the start of the buffer in one transfer
    pub fn upload<T: Pod>(&mut self, handle: BufferHandle, records: &[T]) -> Result<(), WaveError> {
        let live = Self::live_for(&self.live, handle)?;

        let actual = std::mem::size_of::<T>();
        if actual != live.stride {
            return Err(WaveError::StrideMismatch {
                expected: live.stride,
                actual,
            });
        }
        if records.len() > live.capacity {
            return Err(WaveError::CapacityExceeded {
                len: records.len(),
                capacity: live.capacity,
            });
        }

        self.device
            .write_buffer(&live.buffer, 0, bytemuck::cast_slice(records));
        debug!("Uploaded {} records to wave buffer {}", records.len(), handle);

        Ok(())
    }

    /// Re-associate the buffer with `slot` (no data movement)
    pub fn rebind(&mut self, handle: BufferHandle, slot: &str) -> Result<(), WaveError> {
        let live = match self.live.as_mut() {
            Some(live) if live.handle == handle => live,
            _ => return Err(WaveError::UseAfterFree(handle)),
        };

        self.device
            .bind_buffer(slot, &live.buffer)
            .map_err(WaveError::Bind)?;
        if !live.slots.iter().any(|s| s == slot) {
            live.slots.push(slot.to_string());
        }

        Ok(())
    }

    /// Unbind and free the buffer. Returns false if nothing was allocated.
    pub fn release(&mut self) -> bool {
        let Some(live) = self.live.take() else {
            return false;
        };

        for slot in &live.slots {
            self.device.unbind_buffer(slot);
        }
        self.device.destroy_buffer(live.buffer);
        debug!("Released wave buffer {}", live.handle);

        true
    }

    /// Handle of the live buffer, if any
    pub fn handle(&self) -> Option<BufferHandle> {
        self.live.as_ref().map(|live| live.handle)
    }

    /// Capacity of the live buffer in records (0 if none)
    pub fn capacity(&self) -> usize {
        self.live.as_ref().map_or(0, |live| live.capacity)
    }

    /// Stride of the live buffer in bytes (0 if none)
    pub fn stride(&self) -> usize {
        self.live.as_ref().map_or(0, |live| live.stride)
    }

    /// Backing resource for `handle`
    pub fn buffer(&self, handle: BufferHandle) -> Result<&D::Buffer, WaveError> {
        Self::live_for(&self.live, handle).map(|live| &live.buffer)
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    fn live_for(
        live: &Option<Allocation<D::Buffer>>,
        handle: BufferHandle,
    ) -> Result<&Allocation<D::Buffer>, WaveError> {
        match live {
            Some(live) if live.handle == handle => Ok(live),
            _ => Err(WaveError::UseAfterFree(handle)),
        }
    }
}

impl<D: BufferDevice> Drop for BufferManager<D> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocean::WaveRecord;
    use crate::rendering::HostBackend;

    fn manager() -> BufferManager<HostBackend> {
        BufferManager::new(HostBackend::new())
    }

    #[test]
    fn test_upload_full_capacity() {
        let mut buffers = manager();
        let handle = buffers.ensure_allocated(64, WaveRecord::STRIDE).unwrap();

        let records = vec![WaveRecord::default(); 64];
        assert!(buffers.upload(handle, &records).is_ok());
        assert_eq!(
            buffers.device().bound_bytes(param_names::WAVES).map(<[u8]>::len),
            Some(64 * WaveRecord::STRIDE)
        );
    }

    #[test]
    fn test_upload_over_capacity_rejected() {
        let mut buffers = manager();
        let handle = buffers.ensure_allocated(64, WaveRecord::STRIDE).unwrap();

        let records = vec![WaveRecord::default(); 65];
        match buffers.upload(handle, &records) {
            Err(WaveError::CapacityExceeded { len, capacity }) => {
                assert_eq!(len, 65);
                assert_eq!(capacity, 64);
            }
            other => panic!("expected CapacityExceeded, got {:?}", other),
        }
        assert_eq!(buffers.device().write_count(), 0);
    }

    #[test]
    fn test_upload_stride_mismatch_rejected() {
        let mut buffers = manager();
        let handle = buffers.ensure_allocated(4, WaveRecord::STRIDE).unwrap();

        let result = buffers.upload(handle, &[0.0f32; 4]);
        assert!(matches!(result, Err(WaveError::StrideMismatch { .. })));
    }

    #[test]
    fn test_ensure_allocated_is_idempotent() {
        let mut buffers = manager();
        let first = buffers.ensure_allocated(64, WaveRecord::STRIDE).unwrap();
        let second = buffers.ensure_allocated(64, WaveRecord::STRIDE).unwrap();

        assert_eq!(first, second);
        assert_eq!(buffers.device().live_buffers(), 1);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut buffers = manager();
        let result = buffers.ensure_allocated(0, WaveRecord::STRIDE);

        assert!(matches!(
            result,
            Err(WaveError::Allocation(DeviceError::ZeroSized))
        ));
        assert!(buffers.handle().is_none());
    }

    #[test]
    fn test_device_failure_propagated() {
        let mut buffers = BufferManager::new(HostBackend::with_memory_limit(1024));
        let result = buffers.ensure_allocated(64, WaveRecord::STRIDE);

        assert!(matches!(
            result,
            Err(WaveError::Allocation(DeviceError::OutOfMemory { .. }))
        ));
        assert_eq!(buffers.device().live_buffers(), 0);
        assert!(buffers.device().bound_bytes(param_names::WAVES).is_none());
    }

    #[test]
    fn test_release_without_allocation_is_noop() {
        let mut buffers = manager();
        assert!(!buffers.release());
        assert!(!buffers.release());
    }

    #[test]
    fn test_stale_handle_is_use_after_free() {
        let mut buffers = manager();
        let handle = buffers.ensure_allocated(8, WaveRecord::STRIDE).unwrap();
        assert!(buffers.release());

        let records = vec![WaveRecord::default(); 8];
        assert!(matches!(
            buffers.upload(handle, &records),
            Err(WaveError::UseAfterFree(h)) if h == handle
        ));
        assert!(matches!(
            buffers.rebind(handle, param_names::WAVES),
            Err(WaveError::UseAfterFree(_))
        ));

        // A fresh allocation does not revive the old handle
        let fresh = buffers.ensure_allocated(8, WaveRecord::STRIDE).unwrap();
        assert_ne!(fresh, handle);
        assert!(buffers.buffer(handle).is_err());
    }

    #[test]
    fn test_rebind_to_unknown_slot_fails() {
        let mut buffers = BufferManager::new(HostBackend::with_slots(&[param_names::WAVES]));
        let handle = buffers.ensure_allocated(8, WaveRecord::STRIDE).unwrap();

        assert!(matches!(
            buffers.rebind(handle, "waves_copy"),
            Err(WaveError::Bind(DeviceError::UnknownSlot(slot))) if slot == "waves_copy"
        ));
        assert!(buffers.rebind(handle, param_names::WAVES).is_ok());
        assert!(buffers.device().bound_bytes("waves_copy").is_none());
    }

    #[test]
    fn test_unbindable_allocation_is_destroyed() {
        let mut buffers = BufferManager::new(HostBackend::with_slots(&["other"]));
        let result = buffers.ensure_allocated(8, WaveRecord::STRIDE);

        assert!(matches!(
            result,
            Err(WaveError::Allocation(DeviceError::UnknownSlot(_)))
        ));
        assert!(buffers.handle().is_none());
        assert_eq!(buffers.device().live_buffers(), 0);
    }

    #[test]
    fn test_release_unbinds_every_slot() {
        let mut buffers = manager();
        let handle = buffers.ensure_allocated(8, WaveRecord::STRIDE).unwrap();
        buffers.rebind(handle, "waves_copy").unwrap();
        assert!(buffers.device().bound_bytes("waves_copy").is_some());

        buffers.release();

        assert!(buffers.device().bound_bytes(param_names::WAVES).is_none());
        assert!(buffers.device().bound_bytes("waves_copy").is_none());
        assert_eq!(buffers.device().live_buffers(), 0);
    }
}
