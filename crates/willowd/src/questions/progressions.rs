//! Static developmental progressions.
//!
//! Fallback question source consulted when the persisted bank cannot fill a
//! tier quota. Entries are ordered easiest-first within each tier; `min_age`
//! gates each entry to children old enough for it to make sense.

use willow_common::{ConcernCategory, SkillTier};

/// One progression entry
#[derive(Debug, Clone, Copy)]
pub struct ProgressionEntry {
    pub text: &'static str,
    pub tier: SkillTier,
    pub min_age: u8,
}

const fn entry(text: &'static str, tier: SkillTier, min_age: u8) -> ProgressionEntry {
    ProgressionEntry { text, tier, min_age }
}

use SkillTier::{Current, Emerging, Foundation};

const COMMUNICATION: &[ProgressionEntry] = &[
    entry("Does your child respond to their own name?", Foundation, 1),
    entry("Does your child point at things they want?", Foundation, 1),
    entry("Does your child use at least ten single words?", Foundation, 2),
    entry("Does your child follow a simple one-step instruction?", Foundation, 2),
    entry("Does your child combine two words together?", Current, 2),
    entry("Can your child name familiar objects in a picture book?", Current, 2),
    entry("Does your child ask simple questions?", Current, 3),
    entry("Can strangers understand most of what your child says?", Current, 3),
    entry("Can your child tell you about something that happened today?", Emerging, 3),
    entry("Can your child retell a short story in order?", Emerging, 4),
    entry("Does your child hold a back-and-forth conversation?", Emerging, 4),
];

const GROSS_MOTOR: &[ProgressionEntry] = &[
    entry("Does your child walk without support?", Foundation, 1),
    entry("Can your child walk up stairs holding a rail?", Foundation, 2),
    entry("Does your child run without falling often?", Foundation, 2),
    entry("Can your child jump with both feet off the ground?", Current, 2),
    entry("Can your child kick a ball forward?", Current, 2),
    entry("Can your child stand on one foot for a few seconds?", Current, 3),
    entry("Can your child pedal a tricycle?", Current, 3),
    entry("Can your child hop on one foot?", Emerging, 4),
    entry("Can your child catch a large ball with both hands?", Emerging, 4),
    entry("Can your child skip with alternating feet?", Emerging, 5),
];

const FINE_MOTOR: &[ProgressionEntry] = &[
    entry("Does your child pick up small objects with finger and thumb?", Foundation, 1),
    entry("Can your child stack four or more blocks?", Foundation, 2),
    entry("Does your child scribble with a crayon?", Foundation, 2),
    entry("Can your child turn pages of a book one at a time?", Current, 2),
    entry("Can your child copy a straight line?", Current, 3),
    entry("Can your child unscrew a jar lid?", Current, 3),
    entry("Can your child copy a circle?", Emerging, 3),
    entry("Can your child cut along a line with child scissors?", Emerging, 4),
    entry("Can your child draw a person with at least three body parts?", Emerging, 4),
    entry("Can your child write some letters of their name?", Emerging, 5),
];

const COGNITION: &[ProgressionEntry] = &[
    entry("Does your child look for a toy hidden under a cloth?", Foundation, 1),
    entry("Does your child imitate everyday actions like sweeping?", Foundation, 2),
    entry("Can your child complete a simple shape puzzle?", Current, 2),
    entry("Does your child sort objects by color or shape?", Current, 3),
    entry("Does your child understand the idea of counting to three?", Current, 3),
    entry("Can your child stay with one activity for ten minutes?", Emerging, 4),
    entry("Does your child understand yesterday and tomorrow?", Emerging, 4),
    entry("Can your child explain the rules of a simple game?", Emerging, 5),
];

const DAILY_LIVING: &[ProgressionEntry] = &[
    entry("Does your child drink from an open cup?", Foundation, 1),
    entry("Does your child feed themselves with a spoon?", Foundation, 2),
    entry("Does your child help with dressing by holding out arms?", Foundation, 2),
    entry("Can your child take off their own shoes?", Current, 2),
    entry("Is your child dry during the day?", Current, 3),
    entry("Can your child wash and dry their hands alone?", Current, 3),
    entry("Can your child dress themselves apart from buttons?", Emerging, 4),
    entry("Can your child manage buttons and zips independently?", Emerging, 5),
    entry("Does your child prepare a simple snack by themselves?", Emerging, 5),
];

const CONDUCT: &[ProgressionEntry] = &[
    entry("Can your child be comforted within a few minutes when upset?", Foundation, 1),
    entry("Does your child accept a change of activity without a meltdown?", Foundation, 2),
    entry("Does your child play alongside other children calmly?", Current, 2),
    entry("Can your child wait a short time for something they want?", Current, 3),
    entry("Does your child share toys when asked?", Current, 3),
    entry("Can your child take turns in a simple game?", Emerging, 4),
    entry("Does your child follow rules at the table most days?", Emerging, 4),
    entry("Can your child resolve a small argument with words?", Emerging, 5),
];

const SCHOOL_READINESS: &[ProgressionEntry] = &[
    entry("Does your child recognize their own written name?", Foundation, 3),
    entry("Can your child sit for a short story without leaving?", Foundation, 3),
    entry("Can your child count five objects accurately?", Current, 4),
    entry("Does your child recognize most letters of the alphabet?", Current, 4),
    entry("Can your child rhyme simple words?", Current, 5),
    entry("Can your child write their first name?", Emerging, 5),
    entry("Can your child follow a three-step instruction?", Emerging, 5),
    entry("Does your child read simple three-letter words?", Emerging, 6),
];

const GENERAL: &[ProgressionEntry] = &[
    entry("Does your child seem curious about new things?", Foundation, 1),
    entry("Does your child make eye contact during play?", Foundation, 1),
    entry("Does your child enjoy playing with other children?", Current, 2),
    entry("Does your child cope with small changes in routine?", Current, 3),
    entry("Does your child try again after something goes wrong?", Emerging, 4),
];

/// Static progression table for a category
pub fn progression_for(category: ConcernCategory) -> &'static [ProgressionEntry] {
    match category {
        ConcernCategory::Communication => COMMUNICATION,
        ConcernCategory::GrossMotor => GROSS_MOTOR,
        ConcernCategory::FineMotor => FINE_MOTOR,
        ConcernCategory::Cognition => COGNITION,
        ConcernCategory::DailyLiving => DAILY_LIVING,
        ConcernCategory::Conduct => CONDUCT,
        ConcernCategory::SchoolReadiness => SCHOOL_READINESS,
        ConcernCategory::General => GENERAL,
    }
}
