use std::sync::Arc;

use chrono::NaiveDate;

use crate::coder::Coder;
use crate::codes::CodeTable;
use crate::config::CoderConfig;
use crate::dictionary::Dictionary;
use crate::text::Sentence;

pub const ACTORS: &str = "\
# countries
RUSSIA [RUS]
CHINA [CHN]
ASIAN [ASA]
{ISRAEL|ISRAELI} [ISR]
JORDAN [JOR]
{EGYPT|EGYPTIAN} [EGY]
SYRIA [SYR]
FRANCE [FRA]

# people
REAGAN [USAELI] [USAGOV 810120-890120]
HOSNI_MUBARAK [EGYGOV]
ADMIRAL_NELSON [GBRMIL]

@GOV
ISRAELI_LABOR_PARTY [ISRGOV 19920713-19960617] [ISROPP 19960618-19990517]
+LABOR_PARTY
";

pub const AGENTS: &str = "\
BANKS [~BUS]
PRESIDENT [GOV]
ADMIRAL [MIL]
ARMY [MIL]
* MINISTER [GOV]
";

pub const VERBS: &str = "\
ASK
- {WILL|WOULD|IS_TO} * + TO HELP FINANCE [0231]
AGREE [019:019]
SIGN [057]
- % * MILITARY ACCORD [062:062]
CRITICIZE [111]
ATTACK [190]
MEET {MET} [036]
NEGOTIATE
- * WITH + [046:046]
VISIT [042:043]
SAY [---]
";

pub fn coder_with(config: CoderConfig) -> Coder {
    let table = Arc::new(CodeTable::builtin());
    let dictionary = Dictionary::builder(&table, &config)
        .actors("actors.txt", ACTORS)
        .unwrap()
        .agents("agents.txt", AGENTS)
        .unwrap()
        .verbs("verbs.txt", VERBS)
        .unwrap()
        .build()
        .unwrap();
    Coder::new(table, Arc::new(dictionary), config).unwrap()
}

pub fn coder() -> Coder {
    coder_with(CoderConfig::default())
}

pub fn sentence(text: &str, y: i32, m: u32, d: u32) -> Sentence {
    Sentence::new("T-1", text, NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

/// `(source, target, code)` of every event, target empty when absent.
pub fn triples(coder: &Coder, s: &Sentence) -> Vec<(String, String, String)> {
    coder
        .code_sentence(s)
        .events
        .iter()
        .map(|e| {
            (
                e.source.to_string(),
                e.target.as_ref().map(|t| t.to_string()).unwrap_or_default(),
                e.event_code.to_string(),
            )
        })
        .collect()
}

pub fn t(source: &str, target: &str, code: &str) -> (String, String, String) {
    (source.to_string(), target.to_string(), code.to_string())
}
