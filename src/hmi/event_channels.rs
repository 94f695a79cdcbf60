use benchscale_core::{InputEvent, InputSource};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};

const CHANNEL_DEPTH: usize = 16;

pub type InputEventChannel = Channel<CriticalSectionRawMutex, InputEvent, CHANNEL_DEPTH>;
pub type InputEventSender<'a> = Sender<'a, CriticalSectionRawMutex, InputEvent, CHANNEL_DEPTH>;
pub type InputEventReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, InputEvent, CHANNEL_DEPTH>;

/// Drains whatever the input task has queued, without waiting.
pub struct QueuedInput<'a> {
    receiver: InputEventReceiver<'a>,
}

impl<'a> QueuedInput<'a> {
    pub fn new(receiver: InputEventReceiver<'a>) -> Self {
        Self { receiver }
    }
}

impl InputSource for QueuedInput<'_> {
    fn poll(&mut self) -> Option<InputEvent> {
        self.receiver.try_receive().ok()
    }
}
