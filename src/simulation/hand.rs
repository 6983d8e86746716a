use crate::card::Card;
use crate::simulation::conditions::ConditionSet;
use std::borrow::Borrow;

/// Count the tag entries matching `tag` across a hand
#[inline]
pub fn count_type<C: Borrow<Card>>(hand: &[C], tag: &str) -> u32 {
    hand.iter()
        .map(|c| Borrow::<Card>::borrow(c).type_count(tag))
        .sum()
}

/// The top `size` cards of a shuffled library
#[inline]
pub fn draw<C>(library: &[C], size: usize) -> &[C] {
    &library[..size.min(library.len())]
}

/// Check a hand against every condition in the set.
/// Tags without a condition are ignored; an empty set accepts any hand.
pub fn evaluate<C: Borrow<Card>>(hand: &[C], conditions: &ConditionSet) -> bool {
    conditions
        .iter()
        .all(|(tag, condition)| condition.accepts(count_type(hand, tag)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::conditions::Condition;

    fn forest() -> Card {
        Card::new("Forest", &["Land"])
    }

    fn spiral() -> Card {
        Card::new("Growth Spiral", &["Spell", "Draw", "Ramp"])
    }

    fn dryad() -> Card {
        Card::new("Dryad of the Ilysian Grove", &["Creature", "Ramp"])
    }

    #[test]
    fn test_count_type() {
        let hand = vec![forest(), forest(), spiral(), dryad()];
        assert_eq!(count_type(&hand, "Land"), 2);
        assert_eq!(count_type(&hand, "Ramp"), 2, "Multi-tag cards count for each tag");
        assert_eq!(count_type(&hand, "Artifact"), 0);
    }

    #[test]
    fn test_draw_takes_top_cards() {
        let library = vec![spiral(), forest(), dryad()];
        let hand = draw(&library, 2);
        assert_eq!(hand.len(), 2);
        assert_eq!(hand[0].name(), "Growth Spiral");
        assert_eq!(draw(&library, 10).len(), 3);
    }

    #[test]
    fn test_empty_conditions_accept_any_hand() {
        let conditions = ConditionSet::new();
        assert!(evaluate::<Card>(&[], &conditions));
        assert!(evaluate(&[forest(), spiral()], &conditions));
    }

    #[test]
    fn test_evaluate_ranges() {
        let conditions = ConditionSet::new()
            .with("Land", Condition::between(2, 4))
            .with("Ramp", Condition::at_least(1));

        let good_hand = vec![forest(), forest(), forest(), spiral(), dryad(), dryad(), dryad()];
        assert!(evaluate(&good_hand, &conditions));

        let flooded = vec![forest(), forest(), forest(), forest(), forest(), spiral(), dryad()];
        assert!(!evaluate(&flooded, &conditions), "5 lands exceeds max 4");

        let no_ramp = vec![forest(), forest(), forest()];
        assert!(!evaluate(&no_ramp, &conditions), "missing tag counts as 0");
    }

    #[test]
    fn test_unmentioned_tags_ignored() {
        let conditions = ConditionSet::new().with("Land", Condition::exactly(1));
        let hand = vec![forest(), spiral(), spiral(), spiral()];
        assert!(evaluate(&hand, &conditions));
    }

    #[test]
    fn test_max_zero_forbids_tag() {
        let conditions = ConditionSet::new().with("Creature", Condition::between(0, 0));
        assert!(evaluate(&[forest(), spiral()], &conditions));
        assert!(!evaluate(&[forest(), dryad()], &conditions));
    }

    #[test]
    fn test_repeated_tag_counts_twice() {
        let dual = Card::new("Dual", &["Land", "Land"]);
        let hand = vec![dual.clone(), dual, forest()];
        assert_eq!(count_type(&hand, "Land"), 5);

        let conditions = ConditionSet::new().with("Land", Condition::exactly(5));
        assert!(evaluate(&hand, &conditions));
    }

    #[test]
    fn test_evaluate_borrowed_cards() {
        let conditions = ConditionSet::new().with("Land", Condition::between(1, 1));
        let (f, s) = (forest(), spiral());
        let hand: Vec<&Card> = vec![&f, &s, &s];
        assert!(evaluate(&hand, &conditions));
        assert_eq!(count_type(&hand, "Spell"), 2);
    }

    #[test]
    fn test_evaluate_is_pure() {
        let conditions = ConditionSet::new().with("Land", Condition::between(2, 4));
        let keep = vec![forest(), forest(), spiral()];
        let mull = vec![forest(), spiral(), spiral()];

        let first = evaluate(&keep, &conditions);
        for _ in 0..10 {
            assert!(!evaluate(&mull, &conditions));
            assert_eq!(evaluate(&keep, &conditions), first);
        }
        assert!(first);
    }
}
