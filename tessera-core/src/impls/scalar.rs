use alloc::string::String;
use core::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::{Def, ScalarType, Shape, Shaped, ValueVTable};

macro_rules! impl_scalar {
    ($ty:ty, $name:expr, $scalar:ident, [$($with:ident),* $(,)?]) => {
        unsafe impl Shaped for $ty {
            const SHAPE: &'static Shape = &const {
                Shape::builder_for_sized::<Self>()
                    .type_identifier($name)
                    .vtable(&const {
                        ValueVTable::builder::<Self>()
                            $(.$with())*
                            .with_clone()
                            .with_partial_eq()
                            .with_partial_ord()
                            .with_debug()
                            .build()
                    })
                    .def(Def::Scalar(ScalarType::$scalar))
                    .build()
            };
        }
    };
}

macro_rules! impl_integers {
    ($($ty:ty => $scalar:ident),* $(,)?) => {
        $(impl_scalar!($ty, stringify!($ty), $scalar, [with_default, with_hash, with_display, with_parse]);)*
    };
}

impl_integers!(
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    usize => USize,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    isize => ISize,
);

impl_scalar!(f32, "f32", F32, [with_default, with_display, with_parse]);
impl_scalar!(f64, "f64", F64, [with_default, with_display, with_parse]);
impl_scalar!(bool, "bool", Bool, [with_default, with_hash, with_display, with_parse]);
impl_scalar!(char, "char", Char, [with_default, with_hash, with_display, with_parse]);
impl_scalar!(String, "String", String, [with_default, with_hash, with_display, with_parse]);
impl_scalar!((), "()", Unit, [with_default, with_hash]);

impl_scalar!(IpAddr, "IpAddr", IpAddr, [with_hash, with_display, with_parse]);
impl_scalar!(Ipv4Addr, "Ipv4Addr", Ipv4Addr, [with_hash, with_display, with_parse]);
impl_scalar!(Ipv6Addr, "Ipv6Addr", Ipv6Addr, [with_hash, with_display, with_parse]);
impl_scalar!(SocketAddr, "SocketAddr", SocketAddr, [with_hash, with_display, with_parse]);
