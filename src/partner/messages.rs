//! Fixed partner utterance pools
//!
//! Openings are keyed by condition; everything after the opening is keyed
//! by depth alone. All pools are non-empty.

use super::{Condition, DisclosureDepth, Reciprocity, Timing};

/// Opening move for one condition
#[derive(Debug)]
pub struct Opening {
    /// Never deeper than mildly personal
    pub depth: DisclosureDepth,
    pub messages: &'static [&'static str],
}

static EARLY_RECIPROCAL: Opening = Opening {
    depth: DisclosureDepth::MildlyPersonal,
    messages: &[
        "Hey, nice to meet you. This week has been busy with classes, but I actually like meeting new people.",
        "Hi! I’ve been running around with school stuff, but it’s nice to take a break and talk to someone.",
    ],
};

static EARLY_GUARDED: Opening = Opening {
    depth: DisclosureDepth::Surface,
    messages: &[
        "Hey, nice to meet you. I’ve mostly just been going to class and trying to stay on top of things.",
        "Hi! Nothing too exciting here—just the usual lectures and problem sets.",
    ],
};

static GRADUAL_RECIPROCAL: Opening = Opening {
    depth: DisclosureDepth::Surface,
    messages: &[
        "Hey, nice to meet you. I’m usually a little quiet at first but I warm up once I get talking to someone.",
        "Hi! I can be a bit shy early on, but I do enjoy getting to know people gradually.",
    ],
};

static GRADUAL_GUARDED: Opening = Opening {
    depth: DisclosureDepth::Surface,
    messages: &[
        "Hi, nice to meet you. I’m generally more of a listener than a talker when I first meet someone.",
        "Hey. I don’t usually share a lot about myself right away, but I’m fine chatting a bit.",
    ],
};

static SURFACE: &[&str] = &[
    "I’ve mostly just been bouncing between classes and the dining hall lately.",
    "My days have been pretty routine—class, homework, and trying not to fall asleep in lectures.",
    "Nothing too wild going on, just a lot of readings and assignments to get through.",
    "I spend a lot of time scrolling on my phone between things instead of doing anything interesting.",
];

static MILDLY_PERSONAL: &[&str] = &[
    "Outside of work, I like watching shows and going on walks when the weather isn’t awful.",
    "When I get a break, I usually end up hanging out with friends or playing games in someone’s room.",
    "I really like finding new music and making playlists—it’s kind of my default hobby.",
    "I try to go to the gym a couple times a week, but I’m not always consistent about it.",
    "I’m studying subjects that are pretty intense, so I really value the little relaxing moments I get.",
];

static VULNERABLE: &[&str] = &[
    "I’ve had times here where I’ve felt really overwhelmed and worried I wouldn’t be able to keep up.",
    "Sometimes I feel like everyone else has things figured out and I’m just faking it.",
    "I’ve gone through stretches where I felt pretty isolated, even though I was surrounded by people.",
    "Balancing expectations from family with what I actually want has been really stressful at times.",
    "There have been moments where I seriously questioned whether I belong here as much as other people.",
    "I’m still figuring out how to talk about stress and mental health without feeling like I’m a burden.",
];

pub fn opening(condition: Condition) -> &'static Opening {
    match (condition.timing, condition.reciprocity) {
        (Timing::Early, Reciprocity::Reciprocal) => &EARLY_RECIPROCAL,
        (Timing::Early, Reciprocity::Guarded) => &EARLY_GUARDED,
        (Timing::Gradual, Reciprocity::Reciprocal) => &GRADUAL_RECIPROCAL,
        (Timing::Gradual, Reciprocity::Guarded) => &GRADUAL_GUARDED,
    }
}

pub fn content(depth: DisclosureDepth) -> &'static [&'static str] {
    match depth {
        DisclosureDepth::Surface => SURFACE,
        DisclosureDepth::MildlyPersonal => MILDLY_PERSONAL,
        DisclosureDepth::Vulnerable => VULNERABLE,
    }
}
