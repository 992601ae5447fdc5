//! Clinical vocabulary used by extraction and phrasing.
//!
//! Terms are matched case-insensitively on word boundaries against lowercased text.

use regex::Regex;
use std::sync::LazyLock;
use summary_types::FocusArea;

/// Broad clinical domain of a fact, used to rank facts under a focus area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Domain {
    Cardiovascular,
    Metabolic,
    Oncology,
    Respiratory,
    Renal,
    Preventive,
}

impl Domain {
    const fn bit(self) -> u8 {
        match self {
            Domain::Cardiovascular => 1,
            Domain::Metabolic => 1 << 1,
            Domain::Oncology => 1 << 2,
            Domain::Respiratory => 1 << 3,
            Domain::Renal => 1 << 4,
            Domain::Preventive => 1 << 5,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Domain::Cardiovascular => "cardiovascular",
            Domain::Metabolic => "metabolic",
            Domain::Oncology => "oncology",
            Domain::Respiratory => "respiratory",
            Domain::Renal => "renal",
            Domain::Preventive => "preventive",
        }
    }
}

const ALL_DOMAINS: [Domain; 6] = [
    Domain::Cardiovascular,
    Domain::Metabolic,
    Domain::Oncology,
    Domain::Respiratory,
    Domain::Renal,
    Domain::Preventive,
];

/// Small set of [`Domain`]s.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct DomainSet(u8);

impl DomainSet {
    pub(crate) fn of(domain: Domain) -> Self {
        Self(domain.bit())
    }

    pub(crate) fn insert(&mut self, domain: Domain) {
        self.0 |= domain.bit();
    }

    pub(crate) fn union(self, other: DomainSet) -> DomainSet {
        DomainSet(self.0 | other.0)
    }

    pub(crate) fn contains(self, domain: Domain) -> bool {
        self.0 & domain.bit() != 0
    }

    pub(crate) fn intersects(self, other: DomainSet) -> bool {
        self.0 & other.0 != 0
    }

    pub(crate) fn intersection(self, other: DomainSet) -> DomainSet {
        DomainSet(self.0 & other.0)
    }

    pub(crate) fn first(self) -> Option<Domain> {
        ALL_DOMAINS.into_iter().find(|d| self.contains(*d))
    }
}

/// Domains a focus area brings forward. `General` brings nothing forward.
pub(crate) fn focus_domains(focus: FocusArea) -> DomainSet {
    match focus {
        FocusArea::General => DomainSet::default(),
        FocusArea::Cardiology => DomainSet::of(Domain::Cardiovascular),
        FocusArea::Oncology => DomainSet::of(Domain::Oncology),
        FocusArea::PrimaryCare => {
            DomainSet::of(Domain::Metabolic).union(DomainSet::of(Domain::Preventive))
        }
    }
}

/// Measurement kinds the engine can read numerically.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MeasureKind {
    BloodPressure,
    HeartRate,
    OxygenSaturation,
    Temperature,
    HbA1c,
    Glucose,
    Potassium,
}

/// A known chronic or recurring condition.
pub(crate) struct Condition {
    /// Display name; `None` keeps the wording from the record.
    pub canonical: Option<&'static str>,
    /// Lay wording shown to patients.
    pub plain: &'static str,
    pub terms: &'static [&'static str],
    pub domain: Domain,
    pub treated_by: &'static [&'static str],
    pub markers: &'static [MeasureKind],
}

pub(crate) static CONDITIONS: &[Condition] = &[
    Condition {
        canonical: Some("Hypertension"),
        plain: "High blood pressure (hypertension)",
        terms: &["hypertension", "htn", "high blood pressure", "elevated blood pressure"],
        domain: Domain::Cardiovascular,
        treated_by: &[
            "lisinopril", "losartan", "amlodipine", "hydrochlorothiazide", "hctz", "valsartan",
            "enalapril", "chlorthalidone", "olmesartan", "metoprolol", "carvedilol",
        ],
        markers: &[MeasureKind::BloodPressure],
    },
    Condition {
        canonical: Some("Type 2 Diabetes"),
        plain: "Type 2 diabetes (high blood sugar)",
        terms: &[
            "type 2 diabetes", "type ii diabetes", "type 2 diabetes mellitus", "t2dm", "dm2",
            "dm type 2", "diabetes mellitus type 2", "diabetes type 2", "niddm",
        ],
        domain: Domain::Metabolic,
        treated_by: &[
            "metformin", "glipizide", "glyburide", "glimepiride", "sitagliptin", "empagliflozin",
            "dapagliflozin", "semaglutide", "dulaglutide", "liraglutide", "pioglitazone", "insulin",
        ],
        markers: &[MeasureKind::HbA1c, MeasureKind::Glucose],
    },
    Condition {
        canonical: Some("Type 1 Diabetes"),
        plain: "Type 1 diabetes",
        terms: &["type 1 diabetes", "t1dm", "dm1", "diabetes mellitus type 1"],
        domain: Domain::Metabolic,
        treated_by: &["insulin"],
        markers: &[MeasureKind::HbA1c, MeasureKind::Glucose],
    },
    Condition {
        canonical: Some("Hyperlipidemia"),
        plain: "High cholesterol (hyperlipidemia)",
        terms: &["hyperlipidemia", "dyslipidemia", "hypercholesterolemia", "high cholesterol"],
        domain: Domain::Cardiovascular,
        treated_by: &["atorvastatin", "rosuvastatin", "simvastatin", "pravastatin", "ezetimibe"],
        markers: &[],
    },
    Condition {
        canonical: Some("Coronary Artery Disease"),
        plain: "Narrowed heart arteries (coronary artery disease)",
        terms: &["coronary artery disease", "cad", "ischemic heart disease"],
        domain: Domain::Cardiovascular,
        treated_by: &["aspirin", "clopidogrel", "nitroglycerin", "atorvastatin", "metoprolol"],
        markers: &[],
    },
    Condition {
        canonical: Some("Heart Failure"),
        plain: "Heart failure (the heart does not pump as strongly as it should)",
        terms: &["heart failure", "chf", "hfref", "hfpef", "congestive heart failure"],
        domain: Domain::Cardiovascular,
        treated_by: &["furosemide", "sacubitril", "spironolactone", "carvedilol", "metoprolol"],
        markers: &[],
    },
    Condition {
        canonical: Some("Atrial Fibrillation"),
        plain: "Irregular heartbeat (atrial fibrillation)",
        terms: &["atrial fibrillation", "afib", "a-fib", "af"],
        domain: Domain::Cardiovascular,
        treated_by: &["apixaban", "rivaroxaban", "warfarin", "dabigatran", "diltiazem", "metoprolol"],
        markers: &[MeasureKind::HeartRate],
    },
    Condition {
        canonical: Some("Asthma"),
        plain: "Asthma",
        terms: &["asthma"],
        domain: Domain::Respiratory,
        treated_by: &["albuterol", "fluticasone", "budesonide", "montelukast", "salmeterol"],
        markers: &[MeasureKind::OxygenSaturation],
    },
    Condition {
        canonical: Some("COPD"),
        plain: "Chronic lung disease (COPD)",
        terms: &["copd", "chronic obstructive pulmonary disease", "emphysema"],
        domain: Domain::Respiratory,
        treated_by: &["tiotropium", "albuterol", "ipratropium", "umeclidinium"],
        markers: &[MeasureKind::OxygenSaturation],
    },
    Condition {
        canonical: Some("Chronic Kidney Disease"),
        plain: "Reduced kidney function (chronic kidney disease)",
        terms: &["chronic kidney disease", "ckd"],
        domain: Domain::Renal,
        treated_by: &[],
        markers: &[MeasureKind::Potassium],
    },
    Condition {
        canonical: Some("Hypothyroidism"),
        plain: "Underactive thyroid (hypothyroidism)",
        terms: &["hypothyroidism"],
        domain: Domain::Metabolic,
        treated_by: &["levothyroxine"],
        markers: &[],
    },
    Condition {
        canonical: Some("Depression"),
        plain: "Depression",
        terms: &["depression", "major depressive disorder", "mdd"],
        domain: Domain::Preventive,
        treated_by: &["sertraline", "fluoxetine", "escitalopram", "citalopram", "bupropion"],
        markers: &[],
    },
    Condition {
        canonical: Some("GERD"),
        plain: "Acid reflux (GERD)",
        terms: &["gerd", "acid reflux", "gastroesophageal reflux"],
        domain: Domain::Preventive,
        treated_by: &["omeprazole", "pantoprazole", "famotidine", "esomeprazole"],
        markers: &[],
    },
    Condition {
        canonical: None,
        plain: "Cancer",
        terms: &[
            "cancer", "carcinoma", "lymphoma", "leukemia", "melanoma", "malignancy", "tumor",
            "sarcoma", "myeloma", "metastatic",
        ],
        domain: Domain::Oncology,
        treated_by: &["tamoxifen", "anastrozole", "letrozole", "chemotherapy", "pembrolizumab"],
        markers: &[],
    },
];

/// Finds the known condition mentioned in lowercased `text`, if any.
pub(crate) fn match_condition(text_lower: &str) -> Option<&'static Condition> {
    CONDITIONS
        .iter()
        .find(|c| c.terms.iter().any(|t| contains_term(text_lower, t)))
}

/// Keyword table for classifying free text into domains.
static DOMAIN_TERMS: &[(Domain, &[&str])] = &[
    (
        Domain::Cardiovascular,
        &[
            "bp", "blood pressure", "heart rate", "hr", "pulse", "troponin", "bnp", "ecg", "ekg",
            "echo", "echocardiogram", "ejection fraction", "cardiac", "coronary", "ldl", "hdl",
            "cholesterol", "lipid", "lipid panel", "triglycerides", "stress test", "angiogram",
            "heart", "chest pain", "palpitations",
        ],
    ),
    (
        Domain::Metabolic,
        &[
            "a1c", "hba1c", "glucose", "blood sugar", "tsh", "thyroid", "insulin", "diabetes",
            "diabetic",
        ],
    ),
    (
        Domain::Oncology,
        &[
            "tumor", "mass", "biopsy", "psa", "cea", "ca-125", "ca 125", "afp", "metastasis",
            "metastatic", "malignant", "malignancy", "carcinoma", "cancer", "lymph node",
            "oncology", "chemotherapy", "nodule", "mammogram", "pet scan", "pet/ct", "lesion",
        ],
    ),
    (
        Domain::Respiratory,
        &[
            "spo2", "o2 sat", "oxygen", "respiratory rate", "rr", "peak flow", "spirometry",
            "fev1", "chest x-ray", "cxr", "pulmonary", "lung", "shortness of breath", "wheezing",
        ],
    ),
    (
        Domain::Renal,
        &[
            "creatinine", "egfr", "bun", "potassium", "sodium", "urinalysis", "kidney", "renal",
        ],
    ),
    (
        Domain::Preventive,
        &[
            "screening", "vaccine", "vaccination", "immunization", "colonoscopy", "bmi",
            "weight", "eye exam", "foot exam", "lipid panel", "a1c",
        ],
    ),
];

/// Classifies lowercased free text into every domain it mentions.
pub(crate) fn classify(text_lower: &str) -> DomainSet {
    let text = text_lower.replace("body mass index", "bmi");
    let mut set = DomainSet::default();
    for (domain, terms) in DOMAIN_TERMS {
        if terms.iter().any(|t| contains_term(&text, t)) {
            set.insert(*domain);
        }
    }
    for condition in CONDITIONS {
        let named = condition.terms.iter().any(|t| contains_term(&text, t));
        let treated = condition.treated_by.iter().any(|t| contains_term(&text, t));
        if named || treated {
            set.insert(condition.domain);
        }
    }
    set
}

/// Allergy classes and the drugs that belong to them.
static ALLERGY_CLASSES: &[(&[&str], &[&str])] = &[
    (
        &["penicillin", "penicillins", "pcn"],
        &[
            "penicillin", "amoxicillin", "ampicillin", "augmentin", "piperacillin", "nafcillin",
            "dicloxacillin", "oxacillin",
        ],
    ),
    (
        &["sulfa", "sulfonamide", "sulfonamides"],
        &["sulfamethoxazole", "bactrim", "sulfasalazine", "sulfadiazine"],
    ),
    (
        &["cephalosporin", "cephalosporins"],
        &["cephalexin", "cefazolin", "ceftriaxone", "cefdinir", "cefuroxime"],
    ),
    (
        &["nsaid", "nsaids", "aspirin"],
        &["aspirin", "ibuprofen", "naproxen", "ketorolac", "diclofenac", "celecoxib"],
    ),
    (
        &["opioid", "opioids", "codeine", "morphine"],
        &["codeine", "morphine", "oxycodone", "hydrocodone", "hydromorphone", "tramadol"],
    ),
    (&["statin", "statins"], &["atorvastatin", "rosuvastatin", "simvastatin", "pravastatin"]),
    (&["ace inhibitor", "ace inhibitors"], &["lisinopril", "enalapril", "ramipril", "benazepril"]),
];

/// Returns true if a medication named `medication_lower` conflicts with an allergy to
/// `allergen_lower`, either by direct name or by drug class.
pub(crate) fn allergy_conflict(allergen_lower: &str, medication_lower: &str) -> bool {
    let allergen = allergen_lower.trim();
    if allergen.is_empty() {
        return false;
    }
    if contains_term(medication_lower, allergen) {
        return true;
    }
    ALLERGY_CLASSES.iter().any(|(names, members)| {
        names.iter().any(|n| contains_term(allergen, n))
            && members.iter().any(|m| contains_term(medication_lower, m))
    })
}

/// Chief-complaint wording that marks a visit as routine.
pub(crate) static ROUTINE_VISIT_TERMS: &[&str] = &[
    "routine", "follow-up", "follow up", "followup", "annual", "check-up", "checkup", "physical",
    "wellness", "refill", "medication review",
];

/// Presentations that need immediate evaluation.
pub(crate) static RED_FLAG_TERMS: &[&str] = &[
    "chest pain", "shortness of breath", "dyspnea", "syncope", "fainting", "passed out", "stroke",
    "slurred speech", "facial droop", "one-sided weakness", "severe headache", "worst headache",
    "seizure", "confusion", "altered mental status", "hemoptysis", "coughing blood",
    "vomiting blood", "hematemesis", "melena", "black stools", "suicidal", "anaphylaxis", "sepsis",
    "high fever", "unresponsive",
];

/// Wording that makes a finding or problem critical.
pub(crate) static CRITICAL_TERMS: &[&str] = &[
    "critical", "stat", "positive troponin", "elevated troponin", "troponin elevated", "stemi",
    "hemorrhage", "haemorrhage", "pulmonary embolism", "pneumothorax", "acute", "unstable",
    "decompensated", "panic value", "sepsis",
];

/// Wording that makes a finding abnormal.
pub(crate) static ABNORMAL_TERMS: &[&str] = &[
    "abnormal", "elevated", "high", "low", "mass", "nodule", "suspicious", "opacity", "effusion",
    "positive", "fracture", "consolidation", "stenosis", "enlarged", "decreased", "increased",
    "lesion", "infiltrate",
];

/// Explicit status wording, checked in this order.
pub(crate) static WORSENING_TERMS: &[&str] = &[
    "uncontrolled", "poorly controlled", "not controlled", "not well controlled", "worsening",
    "progressing", "progressive", "exacerbation", "decompensated", "flare", "deteriorating",
];
pub(crate) static RESOLVED_TERMS: &[&str] = &["resolved", "in remission", "remission", "s/p", "status post"];
pub(crate) static CONTROLLED_TERMS: &[&str] = &["controlled", "well controlled", "at goal"];
pub(crate) static STABLE_TERMS: &[&str] = &["stable"];

/// Wording that marks a lab or imaging entry as outstanding.
pub(crate) static PENDING_TERMS: &[&str] = &[
    "pending", "ordered", "awaiting", "scheduled", "to be drawn", "results to follow",
    "not yet resulted",
];

/// Wording that marks outstanding work as urgent.
pub(crate) static URGENT_ORDER_TERMS: &[&str] = &["stat", "urgent", "critical"];

/// Lead-ins that negate the term that follows within the same clause.
pub(crate) static NEGATIONS: &[&str] = &["no ", "without ", "negative for ", "denies ", "no evidence of "];

/// Ordered lay replacements applied for patient-facing text.
static PLAIN_TERMS: &[(&str, &str)] = &[
    ("twice daily", "twice a day"),
    ("three times daily", "three times a day"),
    ("once daily", "once a day"),
    ("daily", "once a day"),
    ("bid", "twice a day"),
    ("tid", "three times a day"),
    ("qid", "four times a day"),
    ("qhs", "at bedtime"),
    ("prn", "as needed"),
    ("po", "by mouth"),
    ("hba1c", "HbA1c (average blood sugar over about 3 months)"),
    ("a1c", "HbA1c (average blood sugar over about 3 months)"),
    ("bp", "blood pressure"),
    ("hr", "heart rate"),
    ("spo2", "oxygen level"),
    ("ldl", "LDL (\"bad\") cholesterol"),
    ("hypertension", "high blood pressure"),
    ("hyperlipidemia", "high cholesterol"),
    ("hives", "hives (itchy raised welts)"),
    ("anaphylaxis", "anaphylaxis (a severe, life-threatening reaction)"),
    ("cxr", "chest X-ray"),
];

static PLAIN_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    PLAIN_TERMS
        .iter()
        .filter_map(|(term, plain)| {
            Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term)))
                .ok()
                .map(|re| (re, *plain))
        })
        .collect()
});

/// Rewrites clinical shorthand into lay wording. Each span of text is rewritten at most once.
pub(crate) fn plain_language(text: &str) -> String {
    let mut spans: Vec<(usize, usize, &'static str)> = Vec::new();
    for (re, plain) in PLAIN_PATTERNS.iter() {
        for m in re.find_iter(text) {
            let overlaps = spans.iter().any(|(s, e, _)| m.start() < *e && *s < m.end());
            if !overlaps {
                spans.push((m.start(), m.end(), plain));
            }
        }
    }
    spans.sort_by_key(|(start, _, _)| *start);

    let mut out = String::with_capacity(text.len() + 16);
    let mut cursor = 0;
    for (start, end, plain) in spans {
        out.push_str(&text[cursor..start]);
        out.push_str(plain);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Word-boundary containment check on already-lowercased text.
pub(crate) fn contains_term(haystack: &str, term: &str) -> bool {
    find_term(haystack, term).is_some()
}

/// Byte offset of the first word-bounded occurrence of `term` in `haystack`.
pub(crate) fn find_term(haystack: &str, term: &str) -> Option<usize> {
    if term.is_empty() {
        return None;
    }
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(term) {
        let start = from + pos;
        let end = start + term.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return Some(start);
        }
        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

/// True if any term occurs in `text_lower` without a negation in the preceding words.
pub(crate) fn mentions_unnegated(text_lower: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| {
        let mut from = 0;
        while let Some(offset) = find_term(&text_lower[from..], term) {
            let start = from + offset;
            let clause_start = text_lower[..start]
                .rfind(|c: char| matches!(c, ',' | ';' | '.' | ':'))
                .map_or(0, |i| i + 1);
            let lead = &text_lower[clause_start..start];
            if !NEGATIONS.iter().any(|n| lead.contains(n)) {
                return true;
            }
            from = start + term.len();
        }
        false
    })
}
