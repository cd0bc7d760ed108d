use crate::error::PipelineError;

pub const BOOK_COUNT: usize = 66;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Testament {
    Old,
    New,
}

impl Testament {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Old => "OT",
            Self::New => "NT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookEntry {
    /// Code embedded in corpus file names, e.g. `1-01` for Genesis.
    pub code: &'static str,
    pub abbr: &'static str,
    pub name_ko: &'static str,
    /// Reference prefix used on corpus lines, e.g. `창` in `창1:1`.
    pub short_ko: &'static str,
    pub name_en: &'static str,
    pub ordinal: u32,
    pub chapters: u32,
}

impl BookEntry {
    pub fn testament(&self) -> Testament {
        if self.code.starts_with('1') {
            Testament::Old
        } else {
            Testament::New
        }
    }
}

macro_rules! books {
    ($( $ordinal:literal $code:literal $abbr:literal $name_ko:literal $short_ko:literal $name_en:literal $chapters:literal; )*) => {
        [$(
            BookEntry {
                code: $code,
                abbr: $abbr,
                name_ko: $name_ko,
                short_ko: $short_ko,
                name_en: $name_en,
                ordinal: $ordinal,
                chapters: $chapters,
            },
        )*]
    };
}

static BOOKS: [BookEntry; BOOK_COUNT] = books! {
    1 "1-01" "Gen" "창세기" "창" "Genesis" 50;
    2 "1-02" "Exo" "출애굽기" "출" "Exodus" 40;
    3 "1-03" "Lev" "레위기" "레" "Leviticus" 27;
    4 "1-04" "Num" "민수기" "민" "Numbers" 36;
    5 "1-05" "Deu" "신명기" "신" "Deuteronomy" 34;
    6 "1-06" "Jos" "여호수아" "수" "Joshua" 24;
    7 "1-07" "Jdg" "사사기" "삿" "Judges" 21;
    8 "1-08" "Rut" "룻기" "룻" "Ruth" 4;
    9 "1-09" "1Sa" "사무엘상" "삼상" "1 Samuel" 31;
    10 "1-10" "2Sa" "사무엘하" "삼하" "2 Samuel" 24;
    11 "1-11" "1Ki" "열왕기상" "왕상" "1 Kings" 22;
    12 "1-12" "2Ki" "열왕기하" "왕하" "2 Kings" 25;
    13 "1-13" "1Ch" "역대상" "대상" "1 Chronicles" 29;
    14 "1-14" "2Ch" "역대하" "대하" "2 Chronicles" 36;
    15 "1-15" "Ezr" "에스라" "스" "Ezra" 10;
    16 "1-16" "Neh" "느헤미야" "느" "Nehemiah" 13;
    17 "1-17" "Est" "에스더" "에" "Esther" 10;
    18 "1-18" "Job" "욥기" "욥" "Job" 42;
    19 "1-19" "Psa" "시편" "시" "Psalms" 150;
    20 "1-20" "Pro" "잠언" "잠" "Proverbs" 31;
    21 "1-21" "Ecc" "전도서" "전" "Ecclesiastes" 12;
    22 "1-22" "Sng" "아가" "아" "Song of Songs" 8;
    23 "1-23" "Isa" "이사야" "사" "Isaiah" 66;
    24 "1-24" "Jer" "예레미야" "렘" "Jeremiah" 52;
    25 "1-25" "Lam" "예레미야애가" "애" "Lamentations" 5;
    26 "1-26" "Eze" "에스겔" "겔" "Ezekiel" 48;
    27 "1-27" "Dan" "다니엘" "단" "Daniel" 12;
    28 "1-28" "Hos" "호세아" "호" "Hosea" 14;
    29 "1-29" "Joe" "요엘" "욜" "Joel" 3;
    30 "1-30" "Amo" "아모스" "암" "Amos" 9;
    31 "1-31" "Oba" "오바댜" "옵" "Obadiah" 1;
    32 "1-32" "Jon" "요나" "욘" "Jonah" 4;
    33 "1-33" "Mic" "미가" "미" "Micah" 7;
    34 "1-34" "Nah" "나훔" "나" "Nahum" 3;
    35 "1-35" "Hab" "하박국" "합" "Habakkuk" 3;
    36 "1-36" "Zep" "스바냐" "습" "Zephaniah" 3;
    37 "1-37" "Hag" "학개" "학" "Haggai" 2;
    38 "1-38" "Zec" "스가랴" "슥" "Zechariah" 14;
    39 "1-39" "Mal" "말라기" "말" "Malachi" 4;
    40 "2-01" "Mat" "마태복음" "마" "Matthew" 28;
    41 "2-02" "Mar" "마가복음" "막" "Mark" 16;
    42 "2-03" "Luk" "누가복음" "눅" "Luke" 24;
    43 "2-04" "Joh" "요한복음" "요" "John" 21;
    44 "2-05" "Act" "사도행전" "행" "Acts" 28;
    45 "2-06" "Rom" "로마서" "롬" "Romans" 16;
    46 "2-07" "1Co" "고린도전서" "고전" "1 Corinthians" 16;
    47 "2-08" "2Co" "고린도후서" "고후" "2 Corinthians" 13;
    48 "2-09" "Gal" "갈라디아서" "갈" "Galatians" 6;
    49 "2-10" "Eph" "에베소서" "엡" "Ephesians" 6;
    50 "2-11" "Phi" "빌립보서" "빌" "Philippians" 4;
    51 "2-12" "Col" "골로새서" "골" "Colossians" 4;
    52 "2-13" "1Th" "데살로니가전서" "살전" "1 Thessalonians" 5;
    53 "2-14" "2Th" "데살로니가후서" "살후" "2 Thessalonians" 3;
    54 "2-15" "1Ti" "디모데전서" "딤전" "1 Timothy" 6;
    55 "2-16" "2Ti" "디모데후서" "딤후" "2 Timothy" 4;
    56 "2-17" "Tit" "디도서" "딛" "Titus" 3;
    57 "2-18" "Phm" "빌레몬서" "몬" "Philemon" 1;
    58 "2-19" "Heb" "히브리서" "히" "Hebrews" 13;
    59 "2-20" "Jam" "야고보서" "약" "James" 5;
    60 "2-21" "1Pe" "베드로전서" "벧전" "1 Peter" 5;
    61 "2-22" "2Pe" "베드로후서" "벧후" "2 Peter" 3;
    62 "2-23" "1Jo" "요한1서" "요일" "1 John" 5;
    63 "2-24" "2Jo" "요한2서" "요이" "2 John" 1;
    64 "2-25" "3Jo" "요한3서" "요삼" "3 John" 1;
    65 "2-26" "Jud" "유다서" "유" "Jude" 1;
    66 "2-27" "Rev" "요한계시록" "계" "Revelation" 22;
};

/// Static lookup over the 66 canonical books. Misses are configuration
/// errors; there is no fallback book.
#[derive(Debug, Default, Clone, Copy)]
pub struct BookRegistry;

impl BookRegistry {
    pub fn entries(&self) -> &'static [BookEntry] {
        &BOOKS
    }

    pub fn by_code(&self, code: &str) -> Result<&'static BookEntry, PipelineError> {
        BOOKS
            .iter()
            .find(|entry| entry.code == code)
            .ok_or_else(|| PipelineError::UnknownBookCode(code.to_string()))
    }

    pub fn by_abbr(&self, abbr: &str) -> Result<&'static BookEntry, PipelineError> {
        BOOKS
            .iter()
            .find(|entry| entry.abbr.eq_ignore_ascii_case(abbr))
            .ok_or_else(|| PipelineError::UnknownBookAbbr(abbr.to_string()))
    }

    pub fn by_ordinal(&self, ordinal: u32) -> Result<&'static BookEntry, PipelineError> {
        ordinal
            .checked_sub(1)
            .and_then(|index| BOOKS.get(index as usize))
            .ok_or(PipelineError::UnknownOrdinal(ordinal))
    }

    /// Resolves a list of abbreviations into registry order. An empty filter
    /// selects every book.
    pub fn select(&self, abbrs: &[String]) -> Result<Vec<&'static BookEntry>, PipelineError> {
        if abbrs.is_empty() {
            return Ok(BOOKS.iter().collect());
        }

        let mut selected = abbrs
            .iter()
            .map(|abbr| self.by_abbr(abbr))
            .collect::<Result<Vec<_>, _>>()?;
        selected.sort_by_key(|entry| entry.ordinal);
        selected.dedup_by_key(|entry| entry.ordinal);
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn registry_covers_all_66_codes() {
        let registry = BookRegistry;
        for testament in 1..=2 {
            let count = if testament == 1 { 39 } else { 27 };
            for index in 1..=count {
                let code = format!("{testament}-{index:02}");
                assert!(registry.by_code(&code).is_ok(), "missing {code}");
            }
        }
    }

    #[test]
    fn ordinals_are_a_contiguous_permutation() {
        let ordinals: Vec<u32> = BOOKS.iter().map(|entry| entry.ordinal).collect();
        let expected: Vec<u32> = (1..=BOOK_COUNT as u32).collect();
        assert_eq!(ordinals, expected);

        let registry = BookRegistry;
        for ordinal in 1..=66 {
            assert_eq!(registry.by_ordinal(ordinal).unwrap().ordinal, ordinal);
        }
    }

    #[test]
    fn abbreviations_and_prefixes_are_unique() {
        let abbrs: HashSet<&str> = BOOKS.iter().map(|entry| entry.abbr).collect();
        let prefixes: HashSet<&str> = BOOKS.iter().map(|entry| entry.short_ko).collect();
        assert_eq!(abbrs.len(), BOOK_COUNT);
        assert_eq!(prefixes.len(), BOOK_COUNT);
        assert!(BOOKS.iter().all(|entry| entry.abbr.is_ascii()));
    }

    #[test]
    fn code_sort_order_matches_ordinal_order() {
        let mut by_code: Vec<&BookEntry> = BOOKS.iter().collect();
        by_code.sort_by_key(|entry| entry.code);
        assert!(by_code.windows(2).all(|pair| pair[0].ordinal < pair[1].ordinal));
    }

    #[test]
    fn lookups_resolve_expected_books() {
        let registry = BookRegistry;
        let psalms = registry.by_code("1-19").unwrap();
        assert_eq!(psalms.abbr, "Psa");
        assert_eq!(psalms.name_ko, "시편");
        assert_eq!(psalms.chapters, 150);
        assert_eq!(psalms.testament(), Testament::Old);

        let revelation = registry.by_abbr("rev").unwrap();
        assert_eq!(revelation.ordinal, 66);
        assert_eq!(revelation.testament(), Testament::New);
        assert_eq!(BOOKS.iter().map(|entry| entry.chapters).sum::<u32>(), 1189);
    }

    #[test]
    fn unknown_lookups_fail_without_fallback() {
        let registry = BookRegistry;
        assert!(matches!(
            registry.by_code("3-01"),
            Err(PipelineError::UnknownBookCode(code)) if code == "3-01"
        ));
        assert!(matches!(registry.by_ordinal(0), Err(PipelineError::UnknownOrdinal(0))));
        assert!(matches!(registry.by_ordinal(67), Err(PipelineError::UnknownOrdinal(67))));
        assert!(registry.by_abbr("Xyz").is_err());
    }

    #[test]
    fn select_orders_and_dedups_filters() {
        let registry = BookRegistry;
        let selected = registry
            .select(&["Rev".to_string(), "Gen".to_string(), "gen".to_string()])
            .unwrap();
        let abbrs: Vec<&str> = selected.iter().map(|entry| entry.abbr).collect();
        assert_eq!(abbrs, vec!["Gen", "Rev"]);
        assert_eq!(registry.select(&[]).unwrap().len(), BOOK_COUNT);
        assert!(registry.select(&["Nope".to_string()]).is_err());
    }
}
