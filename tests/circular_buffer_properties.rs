use proptest::prelude::*;
use ripple::{CircularBuffer, CircularBufferError, OffsetPolicy};

fn push_all(
    capacity: usize,
    offset_policy: OffsetPolicy,
    values: &[i64],
) -> CircularBuffer<i64> {
    let mut buffer =
        CircularBuffer::with_offset_policy(capacity, offset_policy).unwrap();
    for value in values {
        buffer.push(*value);
    }

    buffer
}

proptest! {
    #[test]
    fn retains_the_most_recent_values(
        capacity in 1usize..32,
        values in prop::collection::vec(any::<i64>(), 0..128),
    ) {
        let buffer = push_all(capacity, OffsetPolicy::Fail, &values);

        for offset in 0..capacity {
            let expected = if offset < values.len() {
                values[values.len() - 1 - offset]
            } else {
                // Never written since construction.
                0
            };

            prop_assert_eq!(*buffer.at(offset).unwrap(), expected);
        }
    }

    #[test]
    fn fail_policy_rejects_every_offset_past_capacity(
        capacity in 1usize..32,
        extra in 0usize..1000,
        values in prop::collection::vec(any::<i64>(), 0..64),
    ) {
        let buffer = push_all(capacity, OffsetPolicy::Fail, &values);
        let offset = capacity + extra;

        prop_assert_eq!(
            buffer.at(offset),
            Err(CircularBufferError::OffsetOutOfRange { offset, capacity })
        );
    }

    #[test]
    fn wrap_policy_reads_the_offset_modulo_capacity(
        capacity in 1usize..32,
        offset in 0usize..1000,
        values in prop::collection::vec(any::<i64>(), 0..64),
    ) {
        let buffer = push_all(capacity, OffsetPolicy::Wrap, &values);

        prop_assert_eq!(buffer.at(offset), buffer.at(offset % capacity));
    }
}

#[test]
fn values_older_than_capacity_are_gone() {
    let capacity = 5;
    let values: Vec<i64> = (1..=12).collect();
    let buffer = push_all(capacity, OffsetPolicy::Fail, &values);

    let retained: Vec<i64> = (0..capacity)
        .map(|offset| *buffer.at(offset).unwrap())
        .collect();

    assert_eq!(retained, vec![12, 11, 10, 9, 8]);
    for old_value in 1..=7 {
        assert!(!retained.contains(&old_value));
    }
}
