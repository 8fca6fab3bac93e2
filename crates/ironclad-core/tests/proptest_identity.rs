//! Property tests for identity text encoding and equality.
//!
//! The identity text form is part of the persisted replay format, so parsing
//! must restore every field exactly, and equality must follow the
//! order-priority rule for arbitrary inputs.

use ironclad_core::prelude::*;
use proptest::prelude::*;

fn camp_strategy() -> impl Strategy<Value = Camp> {
    prop::sample::select(Camp::ALL.to_vec())
}

fn role_strategy() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

fn identity_strategy() -> impl Strategy<Value = Identity> {
    (camp_strategy(), role_strategy(), any::<i32>(), 0..20u32).prop_map(
        |(camp, role, serial, order)| Identity::new(camp, role, serial).with_order(order),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn text_form_restores_every_field(id in identity_strategy()) {
        let text = id.to_string();
        let back: Identity = text.parse().unwrap();
        prop_assert_eq!(back.camp, id.camp);
        prop_assert_eq!(back.role, id.role);
        prop_assert_eq!(back.serial, id.serial);
        prop_assert_eq!(back.order, id.order);
        prop_assert_eq!(back.to_string(), text);
    }

    #[test]
    fn equality_follows_order_priority(a in identity_strategy(), b in identity_strategy()) {
        let expected = if a.order != 0 && b.order != 0 {
            a.order == b.order
        } else {
            a.camp == b.camp && a.role == b.role && a.serial == b.serial
        };
        prop_assert_eq!(a == b, expected);
        prop_assert_eq!(b == a, expected, "equality must be symmetric");
    }

    #[test]
    fn identity_fields_inside_actions_round_trip(victim in identity_strategy(), killer in identity_strategy()) {
        let action = Action::Kill { killer, victim };
        let text = JsonCodec.encode_action(&action).unwrap();
        match JsonCodec.decode_action(&text).unwrap() {
            Action::Kill { killer: k, victim: v } => {
                prop_assert_eq!(k.to_string(), killer.to_string());
                prop_assert_eq!(v.to_string(), victim.to_string());
            }
            other => prop_assert!(false, "decoded wrong variant: {:?}", other),
        }
    }
}
