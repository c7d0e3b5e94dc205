use tessera_core::{EnumRepr, PtrConst, PtrUninit};

/// Reads the discriminant of an enum with a primitive representation.
///
/// # Safety
///
/// `data` must point to an initialized enum whose tag is `repr`.
pub unsafe fn read_discriminant(data: PtrConst<'_>, repr: EnumRepr) -> i64 {
    unsafe {
        match repr {
            EnumRepr::U8 => *data.get::<u8>() as i64,
            EnumRepr::U16 => *data.get::<u16>() as i64,
            EnumRepr::U32 => *data.get::<u32>() as i64,
            EnumRepr::U64 => *data.get::<u64>() as i64,
            EnumRepr::USize => *data.get::<usize>() as i64,
            EnumRepr::I8 => *data.get::<i8>() as i64,
            EnumRepr::I16 => *data.get::<i16>() as i64,
            EnumRepr::I32 => *data.get::<i32>() as i64,
            EnumRepr::I64 => *data.get::<i64>(),
            EnumRepr::ISize => *data.get::<isize>() as i64,
        }
    }
}

/// Writes the discriminant of an enum with a primitive representation.
/// Payload fields are written separately, at their variant offsets.
///
/// # Safety
///
/// `data` must be storage for an enum whose tag is `repr`, and
/// `discriminant` must be one the enum declares.
pub unsafe fn write_discriminant(data: PtrUninit<'_>, repr: EnumRepr, discriminant: i64) {
    unsafe {
        match repr {
            EnumRepr::U8 => data.put(discriminant as u8),
            EnumRepr::U16 => data.put(discriminant as u16),
            EnumRepr::U32 => data.put(discriminant as u32),
            EnumRepr::U64 => data.put(discriminant as u64),
            EnumRepr::USize => data.put(discriminant as usize),
            EnumRepr::I8 => data.put(discriminant as i8),
            EnumRepr::I16 => data.put(discriminant as i16),
            EnumRepr::I32 => data.put(discriminant as i32),
            EnumRepr::I64 => data.put(discriminant),
            EnumRepr::ISize => data.put(discriminant as isize),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::MaybeUninit;
    use core::ptr::NonNull;

    #[allow(dead_code)]
    #[repr(i16)]
    enum Level {
        Low = -3,
        High = 900,
    }

    #[test]
    fn discriminants_round_trip_through_memory() {
        let high = Level::High;
        assert_eq!(
            unsafe { read_discriminant(PtrConst::from_ref(&high), EnumRepr::I16) },
            900
        );

        let mut slot = MaybeUninit::<Level>::uninit();
        unsafe {
            write_discriminant(
                PtrUninit::new(NonNull::from(&mut slot).cast::<Level>()),
                EnumRepr::I16,
                -3,
            );
            assert!(matches!(slot.assume_init(), Level::Low));
        }
    }
}
