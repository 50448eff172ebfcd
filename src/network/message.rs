use crate::prelude::*;
use super::session::Session;
use bytes::BytesMut;
use std::any::Any;
use std::fmt::Debug;

/// A decoded packet, or one about to be encoded.
pub trait Message: Any + Send + Sync + Debug {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn type_name(&self) -> &'static str;
}

#[macro_export]
macro_rules! impl_message {
    ($($t:ty),* $(,)?) => {
        $(
            impl $crate::network::Message for $t {
                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }
                fn into_any(self: Box<Self>) -> Box<dyn ::std::any::Any> {
                    self
                }
                fn type_name(&self) -> &'static str {
                    ::std::any::type_name::<$t>()
                }
            }
        )*
    };
}

/// Per-connection facts a codec may need. Codecs themselves carry no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecContext {
    pub protocol_version: i32,
    pub forge: bool,
}
impl Default for CodecContext {
    fn default() -> Self {
        Self { protocol_version: super::PROTOCOL_VERSION, forge: false }
    }
}

pub trait Codec: Send + Sync + 'static {
    type Message: Message;
    /// The encoding is identical for every recipient.
    const CACHING: bool = false;

    /// Writes the payload, without the opcode.
    fn encode(&self, ctx: &CodecContext, msg: &Self::Message, buf: &mut BytesMut) -> Result<(), CodecError>;
    fn decode(&self, ctx: &CodecContext, buf: &[u8]) -> Result<Self::Message, CodecError> {
        let _ = (ctx, buf);
        Err(CodecError::DecodeUnsupported(std::any::type_name::<Self::Message>()))
    }
}

pub trait Handler<M>: Send + Sync + 'static {
    fn handle(&self, session: &mut Session, msg: M) -> Result<(), Disconnection>;
}
impl<M, F> Handler<M> for F
where
    F: Fn(&mut Session, M) -> Result<(), Disconnection> + Send + Sync + 'static,
{
    fn handle(&self, session: &mut Session, msg: M) -> Result<(), Disconnection> {
        self(session, msg)
    }
}

/// Rewrites one outbound message into any number of wire messages.
pub trait Processor: Send + Sync + 'static {
    type Message: Message;
    /// Every output is itself caching and depends only on the input.
    const CACHING: bool = false;

    fn process(
        &self,
        ctx: &CodecContext,
        msg: &Self::Message,
        out: &mut Vec<Box<dyn Message>>,
    ) -> Result<(), CodecError>;
}

/// Adapters that let the registry hold codecs, handlers and processors of any message type.
pub(super) mod erased {
    use super::*;
    use std::marker::PhantomData;

    pub trait ErasedCodec: Send + Sync {
        fn encode(&self, ctx: &CodecContext, msg: &dyn Message, buf: &mut BytesMut) -> Result<(), CodecError>;
        fn decode(&self, ctx: &CodecContext, buf: &[u8]) -> Result<Box<dyn Message>, CodecError>;
    }
    impl<C: Codec> ErasedCodec for C {
        fn encode(&self, ctx: &CodecContext, msg: &dyn Message, buf: &mut BytesMut) -> Result<(), CodecError> {
            let msg = msg
                .as_any()
                .downcast_ref::<C::Message>()
                .ok_or_else(|| CodecError::Invalid(format!("{} given to the codec for {}", msg.type_name(), std::any::type_name::<C::Message>())))?;
            Codec::encode(self, ctx, msg, buf)
        }
        fn decode(&self, ctx: &CodecContext, buf: &[u8]) -> Result<Box<dyn Message>, CodecError> {
            Ok(Box::new(Codec::decode(self, ctx, buf)?))
        }
    }

    pub trait ErasedHandler: Send + Sync {
        fn handle(&self, session: &mut Session, msg: Box<dyn Message>) -> Result<(), Disconnection>;
    }
    pub struct HandlerBinding<M, H> {
        pub handler: H,
        pub _message: PhantomData<fn(M)>,
    }
    impl<M: Message, H: Handler<M>> ErasedHandler for HandlerBinding<M, H> {
        fn handle(&self, session: &mut Session, msg: Box<dyn Message>) -> Result<(), Disconnection> {
            match msg.into_any().downcast::<M>() {
                Ok(msg) => self.handler.handle(session, *msg),
                Err(_) => Err(CodecError::Invalid(format!("handler for {} got another message", std::any::type_name::<M>())).into()),
            }
        }
    }

    pub trait ErasedProcessor: Send + Sync {
        fn process(&self, ctx: &CodecContext, msg: &dyn Message, out: &mut Vec<Box<dyn Message>>) -> Result<(), CodecError>;
        fn caching(&self) -> bool;
    }
    impl<P: Processor> ErasedProcessor for P {
        fn process(&self, ctx: &CodecContext, msg: &dyn Message, out: &mut Vec<Box<dyn Message>>) -> Result<(), CodecError> {
            let msg = msg
                .as_any()
                .downcast_ref::<P::Message>()
                .ok_or_else(|| CodecError::Invalid(format!("{} given to the processor for {}", msg.type_name(), std::any::type_name::<P::Message>())))?;
            Processor::process(self, ctx, msg, out)
        }
        fn caching(&self) -> bool {
            P::CACHING
        }
    }
}
