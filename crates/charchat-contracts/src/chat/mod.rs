mod message;
mod transcript;

pub use message::{DeliveryStatus, Message, Role};
pub use transcript::{
    PendingSend, SendStart, Transcript, DEFAULT_ASSISTANT_REPLY, DEFAULT_SEND_ERROR,
};
