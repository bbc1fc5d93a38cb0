//! Render-flag bitfield and the bounded command queue an event-handling thread uses to talk
//! to the renderer, per the external-interfaces contract.

use std::collections::VecDeque;

/// Discard back-facing triangles after the perspective divide.
pub const BACKFACE_CULL: u32 = 0b0000_0001;
/// After fill, draw the three triangle edges in opaque white.
pub const OUTLINES: u32 = 0b0000_0010;
/// Skip fill entirely; draw only the three edges. Supersedes fill.
pub const WIREFRAME: u32 = 0b0000_0100;
/// `sample_tex2d` uses bilinear filtering.
pub const BILINEAR: u32 = 0b0000_1000;
/// `sample_tex2d` selects a mipmap level by computed LOD.
pub const MIPMAP: u32 = 0b0001_0000;
/// Only meaningful together with [`MIPMAP`]: blend the two nearest levels.
pub const TRILINEAR: u32 = 0b0010_0000;

/// A render-control command, as issued by an event-handling thread to a renderer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Command {
    Resize(usize, usize),
    SetFlag(u32),
    ClearFlag(u32),
    ToggleFlag(u32),
}

/// A bounded FIFO of [`Command`]s. Pushing past capacity is a programmer mistake (the original
/// engine's 256-entry ring buffer had the same contract) and panics rather than silently
/// dropping or blocking.
pub struct CommandQueue {
    capacity: usize,
    commands: VecDeque<Command>,
}

impl CommandQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            commands: VecDeque::with_capacity(capacity),
        }
    }

    /// # Panics
    ///
    /// Panics if the queue is already at capacity.
    pub fn push(&mut self, command: Command) {
        assert!(
            self.commands.len() < self.capacity,
            "command queue overflow (capacity {})",
            self.capacity
        );
        self.commands.push_back(command);
    }

    pub fn pop(&mut self) -> Option<Command> {
        self.commands.pop_front()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_preserved() {
        let mut q = CommandQueue::new(4);
        q.push(Command::SetFlag(BACKFACE_CULL));
        q.push(Command::Resize(640, 480));
        assert_eq!(q.pop(), Some(Command::SetFlag(BACKFACE_CULL)));
        assert_eq!(q.pop(), Some(Command::Resize(640, 480)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    #[should_panic(expected = "overflow")]
    fn overflow_panics() {
        let mut q = CommandQueue::new(1);
        q.push(Command::SetFlag(WIREFRAME));
        q.push(Command::SetFlag(OUTLINES));
    }
}
