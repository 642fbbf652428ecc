//! Request framing for each analysis subtask.

use crate::domain::{EsgPillar, RiskCategory};

pub fn risk_request(category: RiskCategory, entity: &str, financial_year: &str) -> String {
    let vocabulary = RiskCategory::DISPATCH_ORDER
        .iter()
        .map(|c| format!("\"{}\"", c.label()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a financial risk analyst. Using grounded web search only, assess the \
'{category}' exposure of the listed company '{entity}' for financial year {financial_year}.\n\
\n\
Rules:\n\
- Every statement must be supported by a verifiable citation.\n\
- Prefer regulator filings, then company disclosures, then reputable business press.\n\
- risk_category may list several entries, each taken verbatim from: [{vocabulary}].\n\
- severity is one of High, Medium, Low.\n\
- description, mitigation and impact are elaborated plain text.\n\
\n\
Answer with a single JSON object with the fields risk_title, description, risk_category, \
severity, mitigation, impact and citations (a list of {{title, url}})."
    )
}

pub fn esg_request(pillar: EsgPillar, entity: &str, financial_year: &str) -> String {
    format!(
        "You are an ESG reporting analyst. Using grounded web search only, extract factual \
{pillar} disclosures for the listed company '{entity}' for financial year {financial_year}.\n\
\n\
Rules:\n\
- Every point must be supported by a verifiable citation.\n\
- Prefer regulator portals, then annual/BRSR/sustainability reports, then reputable business press.\n\
- description is a markdown bullet list, one fact per bullet.\n\
\n\
Answer with a single JSON object with the fields esg_category (\"{pillar}\"), description and \
citations (a list of {{title, url}})."
    )
}

/// `findings_json` must already carry the assigned ids and no citations.
pub fn synthesis_request(findings_json: &str) -> String {
    format!(
        "You are a reasoning engine that links related risks.\n\
\n\
The input is a JSON list of risks, each with a fixed integer id. Produce:\n\
- nodes: one per input risk, keeping its id. name is the risk title shortened to under \
100 characters. description is plain text with two 'Logical Connection to:' sections that \
explain how the risk relates to other risk types, inferred from its description, impact and \
mitigation rather than copied.\n\
- links: {{source, target}} pairs of input ids. Link A to B when A's logical connections \
reference B's risk context. Add the reverse link only when B also references A. No duplicates.\n\
\n\
Do not invent ids and do not output citations.\n\
\n\
INPUT = {findings_json}"
    )
}
