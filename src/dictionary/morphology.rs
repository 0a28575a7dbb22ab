//! Verb morphology: inflected forms from a headword lemma
//!
//! Verb dictionaries list lemmas (`ASK`, `AGREE`, `SIGN`). The verb locator
//! needs every surface form, so each lemma is conjugated from a small set of
//! patterns plus a built-in irregular table. A headword that lists its forms
//! explicitly (`MEET {MET MEETS MEETING}`) keeps those and adds the generated
//! ones.
//!
//! Multiword lemmas (`SET UP`, `CALL_FOR`) inflect their first word only.

// =============================================================================
// Conjugation Patterns
// =============================================================================

/// Conjugation pattern for English verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjugation {
    /// ASK → ASKS, ASKED, ASKING
    Regular,
    /// SIGN-style verbs ending in E: AGREE → AGREES, AGREED, AGREEING;
    /// ACCUSE → ACCUSES, ACCUSED, ACCUSING
    RegularE,
    /// BAN → BANS, BANNED, BANNING
    DoubleConsonant,
    /// RALLY → RALLIES, RALLIED, RALLYING
    YToI,
    Irregular {
        past: &'static str,
        past_participle: &'static str,
    },
}

/// Verbs that double their final consonant before -ED / -ING.
const DOUBLING: &[&str] = &[
    "ABET", "ACQUIT", "ADMIT", "BAN", "BAR", "BEG", "BLOT", "COMMIT", "COMPEL", "CONTROL",
    "DROP", "EMBED", "EQUIP", "EXPEL", "GRAB", "JAM", "NAB", "OCCUR", "OMIT", "PATROL",
    "PERMIT", "PLAN", "PLOT", "PROPEL", "REBEL", "REFER", "REGRET", "REPEL", "ROB", "SCRAP",
    "SHIP", "SHRUG", "SHUN", "SLAM", "SNUB", "SPAR", "STAB", "STEP", "STIR", "STOP", "SUBMIT",
    "TAP", "TRANSMIT", "TRAP", "TRIP", "WRAP",
];

/// (base, past, past participle)
const IRREGULAR: &[(&str, &str, &str)] = &[
    ("BEAT", "BEAT", "BEATEN"),
    ("BEGIN", "BEGAN", "BEGUN"),
    ("BID", "BID", "BID"),
    ("BIND", "BOUND", "BOUND"),
    ("BREAK", "BROKE", "BROKEN"),
    ("BRING", "BROUGHT", "BROUGHT"),
    ("BUY", "BOUGHT", "BOUGHT"),
    ("COME", "CAME", "COME"),
    ("CUT", "CUT", "CUT"),
    ("DO", "DID", "DONE"),
    ("DRAW", "DREW", "DRAWN"),
    ("FALL", "FELL", "FALLEN"),
    ("FIGHT", "FOUGHT", "FOUGHT"),
    ("FLEE", "FLED", "FLED"),
    ("FORBID", "FORBADE", "FORBIDDEN"),
    ("FORGIVE", "FORGAVE", "FORGIVEN"),
    ("GET", "GOT", "GOTTEN"),
    ("GIVE", "GAVE", "GIVEN"),
    ("GO", "WENT", "GONE"),
    ("HAVE", "HAD", "HAD"),
    ("HIT", "HIT", "HIT"),
    ("HOLD", "HELD", "HELD"),
    ("KEEP", "KEPT", "KEPT"),
    ("KNOW", "KNEW", "KNOWN"),
    ("LEAD", "LED", "LED"),
    ("LEAVE", "LEFT", "LEFT"),
    ("LEND", "LENT", "LENT"),
    ("LOSE", "LOST", "LOST"),
    ("MAKE", "MADE", "MADE"),
    ("MEET", "MET", "MET"),
    ("OVERTHROW", "OVERTHREW", "OVERTHROWN"),
    ("PUT", "PUT", "PUT"),
    ("QUIT", "QUIT", "QUIT"),
    ("SAY", "SAID", "SAID"),
    ("SEE", "SAW", "SEEN"),
    ("SEEK", "SOUGHT", "SOUGHT"),
    ("SELL", "SOLD", "SOLD"),
    ("SEND", "SENT", "SENT"),
    ("SET", "SET", "SET"),
    ("SHOOT", "SHOT", "SHOT"),
    ("SHUT", "SHUT", "SHUT"),
    ("SINK", "SANK", "SUNK"),
    ("SLAY", "SLEW", "SLAIN"),
    ("SPEAK", "SPOKE", "SPOKEN"),
    ("SPEND", "SPENT", "SPENT"),
    ("SPREAD", "SPREAD", "SPREAD"),
    ("STAND", "STOOD", "STOOD"),
    ("STRIKE", "STRUCK", "STRUCK"),
    ("SWEAR", "SWORE", "SWORN"),
    ("TAKE", "TOOK", "TAKEN"),
    ("TEACH", "TAUGHT", "TAUGHT"),
    ("TELL", "TOLD", "TOLD"),
    ("THINK", "THOUGHT", "THOUGHT"),
    ("THROW", "THREW", "THROWN"),
    ("UNDERSTAND", "UNDERSTOOD", "UNDERSTOOD"),
    ("UNDERTAKE", "UNDERTOOK", "UNDERTAKEN"),
    ("UPHOLD", "UPHELD", "UPHELD"),
    ("WIN", "WON", "WON"),
    ("WITHDRAW", "WITHDREW", "WITHDRAWN"),
    ("WRITE", "WROTE", "WRITTEN"),
];

const VOWELS: &[char] = &['A', 'E', 'I', 'O', 'U'];

impl Conjugation {
    /// Pick the pattern for an uppercase base form.
    pub fn infer(base: &str) -> Self {
        if let Some(&(_, past, past_participle)) = IRREGULAR.iter().find(|(b, _, _)| *b == base) {
            return Self::Irregular { past, past_participle };
        }
        if DOUBLING.contains(&base) {
            return Self::DoubleConsonant;
        }
        if base.len() > 1 && base.ends_with('E') {
            return Self::RegularE;
        }
        if base.len() > 1 && base.ends_with('Y') && !base[..base.len() - 1].ends_with(VOWELS) {
            return Self::YToI;
        }
        Self::Regular
    }

    /// Base, third person singular, past, present participle and, when it
    /// differs, past participle.
    pub fn inflect(&self, base: &str) -> Vec<String> {
        let mut forms = match self {
            Self::Regular => vec![
                base.to_string(),
                third_person_singular(base),
                format!("{}ED", base),
                format!("{}ING", base),
            ],
            Self::RegularE => vec![
                base.to_string(),
                format!("{}S", base),
                format!("{}D", base),
                present_participle(base),
            ],
            Self::DoubleConsonant => {
                let last = base.chars().last().unwrap_or_default();
                vec![
                    base.to_string(),
                    format!("{}S", base),
                    format!("{}{}ED", base, last),
                    format!("{}{}ING", base, last),
                ]
            }
            Self::YToI => {
                let stem = &base[..base.len() - 1];
                vec![
                    base.to_string(),
                    format!("{}IES", stem),
                    format!("{}IED", stem),
                    format!("{}ING", base),
                ]
            }
            Self::Irregular { past, past_participle } => {
                let mut forms = vec![
                    base.to_string(),
                    third_person_singular(base),
                    past.to_string(),
                    present_participle(base),
                ];
                if past != past_participle {
                    forms.push(past_participle.to_string());
                }
                forms
            }
        };
        let mut unique: Vec<String> = Vec::with_capacity(forms.len());
        for form in forms.drain(..) {
            if !unique.contains(&form) {
                unique.push(form);
            }
        }
        unique
    }
}

/// Third person singular, handling sibilants and -O.
fn third_person_singular(base: &str) -> String {
    match base {
        "HAVE" => return "HAS".to_string(),
        "DO" => return "DOES".to_string(),
        _ => {}
    }
    if base.ends_with('S')
        || base.ends_with('X')
        || base.ends_with('Z')
        || base.ends_with("SH")
        || base.ends_with("CH")
        || base.ends_with('O')
    {
        format!("{}ES", base)
    } else if base.len() > 1 && base.ends_with('Y') && !base[..base.len() - 1].ends_with(VOWELS) {
        format!("{}IES", &base[..base.len() - 1])
    } else {
        format!("{}S", base)
    }
}

fn present_participle(base: &str) -> String {
    if DOUBLING.contains(&base) || matches!(base, "BEGIN" | "WIN" | "HIT" | "CUT" | "SET" | "PUT" | "GET" | "SHUT" | "QUIT" | "FORBID" | "BID") {
        let last = base.chars().last().unwrap_or_default();
        return format!("{}{}ING", base, last);
    }
    if base.ends_with('E') && !(base.ends_with("EE") || base.ends_with("YE") || base.ends_with("OE")) && base.len() > 2 {
        return format!("{}ING", &base[..base.len() - 1]);
    }
    format!("{}ING", base)
}

// =============================================================================
// Lemma Conjugation
// =============================================================================

/// All surface forms of a lemma, uppercase and space-joined for multiword
/// lemmas.
pub fn conjugate(lemma: &str) -> Vec<String> {
    let words: Vec<String> = lemma
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(str::to_uppercase)
        .collect();
    let Some((head, rest)) = words.split_first() else {
        return Vec::new();
    };
    let tail = rest.join(" ");
    Conjugation::infer(head)
        .inflect(head)
        .into_iter()
        .map(|form| if tail.is_empty() { form } else { format!("{} {}", form, tail) })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
