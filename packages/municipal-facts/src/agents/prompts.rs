//! Prompt templates for the generation tasks.

use crate::gather::fines::FineHint;
use crate::types::document::truncate_chars;
use crate::types::place::Place;

pub fn discovery(place: &Place) -> String {
    let Place {
        name,
        region_code,
        region_full_name,
    } = place;
    format!(
        r#"You are a US municipal government expert.

TARGET PLACE: {name}, {region_code} ({region_full_name})

You must ONLY provide information about {name} in {region_code} ({region_full_name}).
Do NOT confuse it with any other place named "{name}" in a different state.
If you are not confident about a particular field, use null.

For {name}, {region_code}, provide:
1. The official government website URL for solid waste / sanitation
2. The official department name for waste management
3. The 3-1-1 number or main waste department phone
4. Up to 3 candidate URLs describing bulk item / mattress disposal rules
5. The most likely illegal dumping fine range and ordinance citation

RULES:
- Only output URLs you are HIGHLY confident exist for {name}, {region_code} specifically
- Use null for any field you are uncertain about
- Accuracy matters more than completeness

Return JSON:
{{
  "website_url": "https://... or null",
  "department_name": "Official Dept Name or null",
  "official_phone": "3-1-1 (XXX-XXX-XXXX) or null",
  "candidate_urls": ["url1", "url2"],
  "illegal_dumping_fine": "$X,XXX or null",
  "illegal_dumping_citation": "City Code Chapter X or null"
}}"#
    )
}

pub fn contacts(text: &str, place: &Place, max_chars: usize) -> String {
    format!(
        r#"Extract contact information for the waste management department serving {place}.

Only extract contacts for {place} specifically. Ignore contact details for other
places or states that may appear in the text.

TEXT:
{text}

Find:
- official_phone: main phone number for the {place} waste/sanitation department
- department_name: official name of the {place} department
- website_url: official website URL for {place} waste management

Return JSON:
{{
  "official_phone": "exact text or null",
  "department_name": "exact text or null",
  "website_url": "exact text or null"
}}

Extract exact text. Use null if not found."#,
        text = truncate_chars(text, max_chars),
    )
}

pub fn rules(text: &str, place: &Place, hint: Option<&FineHint>, max_chars: usize) -> String {
    let hint_note = hint.map(FineHint::prompt_note).unwrap_or_default();
    format!(
        r#"Extract curbside collection rules and illegal dumping fines for {place} from the text below.

TEXT:
{text}

SECTION 1: CURBSIDE BULK ITEM RULES
Target: rules for bulk item, mattress and furniture curbside collection in {place}.

IGNORE completely, never extract into curbside_rules:
- Yard waste rules (grass, leaves, branches, brush, biodegradable bags)
- Standard weekly trash cart rules (96-gallon carts, regular trash cans)
- Recycling bin rules (cardboard, glass, cans, paper, plastic, bottles)
- Composting or food waste rules

ONLY extract rules that apply to mattresses, box springs, furniture, couches, bulk items,
large items, heavy trash, oversize items, white goods, appliances or junk pickup.

is_available:
  true  -> the text says bulk/mattress curbside pickup IS available
  false -> the text says it is NOT available or needs special arrangement
  null  -> the text does not say (never default to false)

mattress_specific_rule priority:
  1. Explicit "mattress" or "box spring" rule, quoted exactly
  2. Bulk item, large item, furniture or junk pickup rule, quoted exactly
  3. Only yard waste or trash cart rules found -> null

size_limits and placement_time: bulk items only, never cart sizes or yard waste schedules.

SECTION 2: ILLEGAL DUMPING FINES
Find the fine amount and legal code citation for illegal dumping in {place}.

{hint_note}

- fine_amount: dollar amount only ("$500-$2,000", "Up to $4,000")
- citation: a legal code reference only ("City Code Chapter 18"); null if the text has no section number

Return JSON:
{{
  "curbside_rules": {{
    "is_available": true/false/null,
    "mattress_specific_rule": "exact text or null",
    "placement_time": "exact text or null",
    "size_limits": "exact text or null",
    "the_catch": "exact restriction or null",
    "schedule_logic": "exact scheduling info or null"
  }},
  "illegal_dumping": {{
    "fine_amount": "dollar amount or null",
    "citation": "legal code reference or null"
  }}
}}

null means not found. Do NOT fill fields with yard waste, trash cart or recycling rules."#,
        text = truncate_chars(text, max_chars),
    )
}

pub fn facilities(text: &str, place: &Place, max_chars: usize) -> String {
    let Place {
        name,
        region_code,
        region_full_name,
        ..
    } = place;
    format!(
        r#"Extract drop-off facilities that accept mattresses or bulk waste in {name}, {region_code} ({region_full_name}).

TEXT:
{text}

Only extract facilities physically located in or near {name}, {region_code}.
Do NOT include facilities from other states or unrelated places.

INCLUDE: landfills, transfer stations, bulk waste centers, reuse/recycle centers that
accept mattresses or large items.
EXCLUDE: facilities that ONLY accept cardboard, glass, cans or paper.

Return JSON:
{{
  "drop_off_locations": [
    {{
      "name": "exact text",
      "address": "full address with city and {region_code}",
      "type": "Landfill/Transfer Station/Drop-Off Center or null",
      "hours": "exact text or null",
      "tipping_fee": "exact text or null",
      "residency_required": true/false/null,
      "notes": "exact text or null"
    }}
  ]
}}"#,
        text = truncate_chars(text, max_chars),
    )
}

pub fn audit(extracted_json: &str, text: &str, place: &Place, hint: Option<&FineHint>, max_chars: usize) -> String {
    let fine_note = hint
        .map(|hint| {
            format!(
                "\n\nFINE FROM VERIFIED SEARCH SNIPPET:\n{}\n\
                 If illegal_dumping.fine_amount is set in EXTRACTED DATA, do NOT remove it even if \
                 it does not appear in SOURCE TEXT. It was verified from a separate search result.",
                hint.prompt_note()
            )
        })
        .unwrap_or_default();
    format!(
        r#"Verify and correct extracted waste management data for {place}.

EXTRACTED DATA:
{extracted}

SOURCE TEXT:
{text}{fine_note}

VERIFICATION RULES:
1. Facilities: KEEP if they accept ANY of mattresses, bulk waste, furniture, large items.
   Only remove a facility that explicitly accepts ONLY cardboard, glass, cans or paper.
2. Facilities: REMOVE if the address clearly belongs to a state other than {code}.
3. Rules: if rules mention bulk items or furniture, KEEP them even without the word "mattress".
4. Phone: KEEP if it is for waste or sanitation in {place}.
5. is_available: keep null when there is simply no information. Never change null to false.
6. fine_amount: if already set, preserve it.
7. When in doubt, KEEP the data.

Return corrected JSON with the same structure."#,
        extracted = truncate_chars(extracted_json, max_chars),
        text = truncate_chars(text, max_chars),
        code = place.region_code,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn austin() -> Place {
        Place::lookup("Austin", "TX").unwrap()
    }

    #[test]
    fn test_prompts_name_place_and_region() {
        let place = austin();
        for prompt in [
            discovery(&place),
            contacts("text", &place, 100),
            rules("text", &place, None, 100),
            facilities("text", &place, 100),
        ] {
            assert!(prompt.contains("Austin"));
            assert!(prompt.contains("TX"));
        }
        assert!(discovery(&place).contains("Texas"));
    }

    #[test]
    fn test_text_is_truncated() {
        let text = "x".repeat(10_000);
        let prompt = contacts(&text, &austin(), 3_000);
        assert!(prompt.matches('x').count() < 3_100);
    }

    #[test]
    fn test_hint_reaches_rules_and_audit() {
        let hint = FineHint::from_snippet("illegal dumping fine up to $2,000").unwrap();
        assert!(rules("t", &austin(), Some(&hint), 100).contains("$2,000"));
        assert!(audit("{}", "t", &austin(), Some(&hint), 100).contains("do NOT remove"));
        assert!(!audit("{}", "t", &austin(), None, 100).contains("VERIFIED SEARCH"));
    }
}
