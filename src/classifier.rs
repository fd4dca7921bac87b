use crate::error::{AnalysisError, Result};
use crate::schema::{ColumnRole, RoleMap};
use crate::template::{INBOUND_AMOUNT_VARIANTS, OUTBOUND_AMOUNT_VARIANTS};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Token marking a note-count column. A column carrying it must never be
/// read as money.
pub const QUANTITY_TOKEN: &str = "qtd";

const NOTE_TOKEN: &str = "nota";
pub(crate) const INBOUND_KEYWORDS: &[&str] = &["entrada", "receita", "faturamento"];
pub(crate) const OUTBOUND_KEYWORDS: &[&str] = &["saida", "saída", "despesa"];
pub(crate) const PERIOD_KEYWORDS: &[&str] = &["mes", "mês", "periodo", "data"];
const CURRENCY_MARKERS: &[&str] = &["r$", "$"];

/// One rule match during classification: which column was bound to which
/// role, and under which rule. The ordered list of these replaces ad-hoc
/// console narration; callers decide whether to log or surface it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoleDecision {
    pub column: String,
    pub role: ColumnRole,
    pub rule: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClassificationTrace {
    pub decisions: Vec<RoleDecision>,
}

impl ClassificationTrace {
    pub fn decision_for(&self, role: ColumnRole) -> Option<&RoleDecision> {
        self.decisions.iter().find(|d| d.role == role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RuleScope {
    /// Any column not already claimed by an earlier rule.
    Unclaimed,
    /// Unclaimed columns free of the quantity token. Monetary roles may
    /// only ever bind here.
    AmountCandidate,
    /// Every column, claimed or not.
    Any,
}

/// A single declarative classification rule. Rules are evaluated in list
/// order; within a rule, columns are scanned in table order and the first
/// eligible match wins.
struct Rule {
    name: &'static str,
    role: ColumnRole,
    scope: RuleScope,
    matches: fn(&str) -> bool,
}

pub(crate) fn fold(name: &str) -> String {
    name.trim().to_lowercase()
}

pub(crate) fn contains_any(folded: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|t| folded.contains(t))
}

fn has_currency_marker(folded: &str) -> bool {
    contains_any(folded, CURRENCY_MARKERS)
}

fn matches_inbound_count(folded: &str) -> bool {
    folded.contains(QUANTITY_TOKEN) && contains_any(folded, INBOUND_KEYWORDS)
}

fn matches_outbound_count(folded: &str) -> bool {
    folded.contains(QUANTITY_TOKEN) && contains_any(folded, OUTBOUND_KEYWORDS)
}

fn matches_inbound_exact(folded: &str) -> bool {
    INBOUND_AMOUNT_VARIANTS.contains(&folded)
}

fn matches_outbound_exact(folded: &str) -> bool {
    OUTBOUND_AMOUNT_VARIANTS.contains(&folded)
}

// Keyword fallback for monetary columns. All three conditions are
// mandatory: the role keyword, a currency marker, and no "nota" token,
// otherwise note-count columns shadow the real monetary ones.
fn matches_inbound_fallback(folded: &str) -> bool {
    contains_any(folded, INBOUND_KEYWORDS)
        && has_currency_marker(folded)
        && !folded.contains(NOTE_TOKEN)
}

fn matches_outbound_fallback(folded: &str) -> bool {
    contains_any(folded, OUTBOUND_KEYWORDS)
        && has_currency_marker(folded)
        && !folded.contains(NOTE_TOKEN)
}

fn matches_period(folded: &str) -> bool {
    contains_any(folded, PERIOD_KEYWORDS)
}

/// Rule-based, deterministic column classifier. Count roles are resolved
/// first so that note-count columns are off the table before any monetary
/// rule runs; exact template-header matches take priority over keyword
/// fallbacks; the period column is found last, over all columns.
pub struct ColumnClassifier {
    rules: Vec<Rule>,
}

impl ColumnClassifier {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Rule {
                    name: "count/quantity-token",
                    role: ColumnRole::InboundCount,
                    scope: RuleScope::Unclaimed,
                    matches: matches_inbound_count,
                },
                Rule {
                    name: "count/quantity-token",
                    role: ColumnRole::OutboundCount,
                    scope: RuleScope::Unclaimed,
                    matches: matches_outbound_count,
                },
                Rule {
                    name: "amount/exact-template-header",
                    role: ColumnRole::InboundAmount,
                    scope: RuleScope::AmountCandidate,
                    matches: matches_inbound_exact,
                },
                Rule {
                    name: "amount/exact-template-header",
                    role: ColumnRole::OutboundAmount,
                    scope: RuleScope::AmountCandidate,
                    matches: matches_outbound_exact,
                },
                Rule {
                    name: "amount/keyword-with-currency",
                    role: ColumnRole::InboundAmount,
                    scope: RuleScope::AmountCandidate,
                    matches: matches_inbound_fallback,
                },
                Rule {
                    name: "amount/keyword-with-currency",
                    role: ColumnRole::OutboundAmount,
                    scope: RuleScope::AmountCandidate,
                    matches: matches_outbound_fallback,
                },
                Rule {
                    name: "period/keyword",
                    role: ColumnRole::Period,
                    scope: RuleScope::Any,
                    matches: matches_period,
                },
            ],
        }
    }

    /// Assign roles to raw column names. Fails fast when a mandatory role
    /// cannot be resolved or a note-count column ends up bound to money.
    pub fn classify(&self, columns: &[String]) -> Result<(RoleMap, ClassificationTrace)> {
        let folded: Vec<String> = columns.iter().map(|c| fold(c)).collect();

        let mut bound: HashMap<ColumnRole, usize> = HashMap::new();
        let mut claimed: HashSet<usize> = HashSet::new();
        let mut decisions = Vec::new();

        for rule in &self.rules {
            if bound.contains_key(&rule.role) {
                continue;
            }

            for (idx, name) in folded.iter().enumerate() {
                let eligible = match rule.scope {
                    RuleScope::Unclaimed => !claimed.contains(&idx),
                    RuleScope::AmountCandidate => {
                        !claimed.contains(&idx) && !name.contains(QUANTITY_TOKEN)
                    }
                    RuleScope::Any => true,
                };

                if !eligible || !(rule.matches)(name) {
                    continue;
                }

                bound.insert(rule.role, idx);
                if rule.scope != RuleScope::Any {
                    claimed.insert(idx);
                }
                decisions.push(RoleDecision {
                    column: columns[idx].clone(),
                    role: rule.role,
                    rule: rule.name.to_string(),
                });
                break;
            }
        }

        ensure_amounts_not_quantity(columns, &folded, &bound)?;

        let mut missing = Vec::new();
        for role in [
            ColumnRole::Period,
            ColumnRole::InboundAmount,
            ColumnRole::OutboundAmount,
        ] {
            if !bound.contains_key(&role) {
                missing.push(role);
            }
        }
        if !missing.is_empty() {
            return Err(AnalysisError::MissingColumns {
                missing,
                columns: columns.to_vec(),
            });
        }

        let role_map = RoleMap {
            period: columns[bound[&ColumnRole::Period]].clone(),
            inbound_amount: columns[bound[&ColumnRole::InboundAmount]].clone(),
            outbound_amount: columns[bound[&ColumnRole::OutboundAmount]].clone(),
            inbound_count: bound
                .get(&ColumnRole::InboundCount)
                .map(|&i| columns[i].clone()),
            outbound_count: bound
                .get(&ColumnRole::OutboundCount)
                .map(|&i| columns[i].clone()),
        };

        Ok((role_map, ClassificationTrace { decisions }))
    }
}

impl Default for ColumnClassifier {
    fn default() -> Self {
        Self::new()
    }
}

// Invariant guard: a monetary role bound to a quantity-tagged column means
// a rule above is broken. Abort the whole ingestion rather than produce
// totals computed from note counts.
fn ensure_amounts_not_quantity(
    columns: &[String],
    folded: &[String],
    bound: &HashMap<ColumnRole, usize>,
) -> Result<()> {
    for role in [ColumnRole::InboundAmount, ColumnRole::OutboundAmount] {
        if let Some(&idx) = bound.get(&role) {
            if folded[idx].contains(QUANTITY_TOKEN) {
                return Err(AnalysisError::QuantityMisbound {
                    role,
                    column: columns[idx].clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::CANONICAL_HEADERS;

    fn classify(names: &[&str]) -> Result<(RoleMap, ClassificationTrace)> {
        let columns: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        ColumnClassifier::new().classify(&columns)
    }

    #[test]
    fn canonical_template_resolves_all_roles() {
        let (roles, trace) = classify(&CANONICAL_HEADERS).unwrap();

        assert_eq!(roles.period, "Mês/Ano");
        assert_eq!(roles.inbound_amount, "Entradas (R$)");
        assert_eq!(roles.outbound_amount, "Saídas (R$)");
        assert_eq!(roles.inbound_count.as_deref(), Some("Qtd. Notas Entrada"));
        assert_eq!(roles.outbound_count.as_deref(), Some("Qtd. Notas Saída"));
        assert_eq!(trace.decisions.len(), 5);
    }

    #[test]
    fn whitespace_and_case_variation_is_tolerated() {
        let (roles, _) = classify(&[
            "  MÊS/ANO ",
            " entradas (r$)",
            "SAÍDAS (R$)  ",
            " qtd. notas entrada",
            "QTD. NOTAS SAÍDA ",
            "Observações",
        ])
        .unwrap();

        assert_eq!(roles.period, "  MÊS/ANO ");
        assert_eq!(roles.inbound_amount, " entradas (r$)");
        assert_eq!(roles.outbound_amount, "SAÍDAS (R$)  ");
        assert!(roles.inbound_count.is_some());
        assert!(roles.outbound_count.is_some());
    }

    #[test]
    fn exact_template_header_beats_earlier_fallback_candidate() {
        let (roles, trace) = classify(&[
            "Mês",
            "Faturamento (R$)",
            "Entradas (R$)",
            "Saídas (R$)",
        ])
        .unwrap();

        assert_eq!(roles.inbound_amount, "Entradas (R$)");
        assert_eq!(
            trace
                .decision_for(ColumnRole::InboundAmount)
                .map(|d| d.rule.as_str()),
            Some("amount/exact-template-header")
        );
    }

    #[test]
    fn fallback_requires_currency_marker() {
        let err = classify(&["Mês", "Receita", "Despesa"]).unwrap_err();
        match err {
            AnalysisError::MissingColumns { missing, columns } => {
                assert!(missing.contains(&ColumnRole::InboundAmount));
                assert!(missing.contains(&ColumnRole::OutboundAmount));
                assert_eq!(columns.len(), 3);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }

        let (roles, trace) = classify(&["Mês", "Receita ($)", "Despesa ($)"]).unwrap();
        assert_eq!(roles.inbound_amount, "Receita ($)");
        assert_eq!(roles.outbound_amount, "Despesa ($)");
        assert_eq!(
            trace
                .decision_for(ColumnRole::OutboundAmount)
                .map(|d| d.rule.as_str()),
            Some("amount/keyword-with-currency")
        );
    }

    #[test]
    fn note_columns_are_excluded_from_fallback() {
        let err = classify(&["Mês", "Notas de Entrada (R$)", "Saídas (R$)"]).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingColumns { .. }));
    }

    #[test]
    fn quantity_columns_never_bind_to_amount_roles() {
        // None of these may classify a qtd column as money, whatever else
        // they resolve to.
        let synthetic: &[&[&str]] = &[
            &["Mês", "Qtd Entradas (R$)", "Saídas (R$)"],
            &["Periodo", "Qtd Receita R$", "Qtd Despesa R$"],
            &["Data", "Entradas (R$)", "Qtd. Notas Saída", "Saídas (R$)"],
        ];

        for names in synthetic {
            match classify(names) {
                Ok((roles, _)) => {
                    assert!(!fold(&roles.inbound_amount).contains(QUANTITY_TOKEN));
                    assert!(!fold(&roles.outbound_amount).contains(QUANTITY_TOKEN));
                }
                Err(AnalysisError::MissingColumns { .. }) => {}
                Err(other) => panic!("unexpected error for {:?}: {:?}", names, other),
            }
        }
    }

    #[test]
    fn misbound_quantity_column_is_a_fatal_fault() {
        let columns = vec!["Qtd Entradas (R$)".to_string()];
        let folded = vec![fold(&columns[0])];
        let mut bound = HashMap::new();
        bound.insert(ColumnRole::InboundAmount, 0);

        let err = ensure_amounts_not_quantity(&columns, &folded, &bound).unwrap_err();
        match err {
            AnalysisError::QuantityMisbound { role, column } => {
                assert_eq!(role, ColumnRole::InboundAmount);
                assert_eq!(column, "Qtd Entradas (R$)");
            }
            other => panic!("expected QuantityMisbound, got {:?}", other),
        }
    }

    #[test]
    fn first_period_keyword_column_wins() {
        let (roles, _) = classify(&["Data Emissão", "Mês/Ano", "Entradas (R$)", "Saídas (R$)"])
            .unwrap();
        assert_eq!(roles.period, "Data Emissão");
    }

    #[test]
    fn duplicate_count_columns_keep_the_first() {
        let (roles, _) = classify(&[
            "Mês/Ano",
            "Qtd Entrada Loja",
            "Qtd Entrada Matriz",
            "Entradas (R$)",
            "Saídas (R$)",
        ])
        .unwrap();
        assert_eq!(roles.inbound_count.as_deref(), Some("Qtd Entrada Loja"));
    }
}
