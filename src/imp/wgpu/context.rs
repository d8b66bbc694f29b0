// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::sync::{Mutex, PoisonError};

/// The device and queue uploads are issued on.
#[derive(Debug, Clone)]
pub struct WgpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl WgpuContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

/**
Holds the context the host has attached, if any.

Attaching is the host's business; until it happens every write fails with "no device
context" and is retried on a later frame.
*/
#[derive(Debug, Default)]
pub(super) struct ContextSlot(Mutex<Option<WgpuContext>>);

impl ContextSlot {
    pub(super) fn new(context: Option<WgpuContext>) -> Self {
        ContextSlot(Mutex::new(context))
    }

    pub(super) fn current(&self) -> Option<WgpuContext> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(super) fn replace(&self, context: Option<WgpuContext>) -> Option<WgpuContext> {
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, context)
    }
}
