use super::dto::AdvisorRequest;

const DETAILS_MARKER: &str = "OUTFIT DETAILS:";

const PREAMBLE: &[&str] = &[
    "You are an AI fashion stylist. Evaluate the outfit described below and return ONLY a single valid JSON object (no explanation, no extra keys) with these keys:\n",
    "  - suitability_score: integer between 0 and 100\n",
    "  - recommendation: either 'recommended' or 'not recommended'\n",
    "  - explanation: detailed explanation (3-6 sentences) that covers color/print, fit, likely occasion(s), season/weather suitability, and at least one concrete suggestion or layering idea\n",
    "  - improvement_suggestions: short suggestions (comma-separated or array)\n",
    "  - better_outfit_idea: one concise alternative outfit idea\n\n",
    "Provide only valid JSON.\n\n",
];

/// Builds the advisor instruction block. Output depends only on the inputs.
pub fn compose(request: &AdvisorRequest, context: Option<&str>) -> String {
    let mut lines: Vec<String> = PREAMBLE.iter().map(|l| l.to_string()).collect();

    if let Some(ctx) = context.filter(|c| !c.is_empty()) {
        lines.push(format!("REFERENCE DATA: {}\n\n", ctx));
    }
    lines.push(format!("{}\n", DETAILS_MARKER));

    let fields = [
        ("Description", &request.description),
        ("Name", &request.outfit_name),
        ("Type", &request.outfit_type),
        ("Size", &request.outfit_size),
        ("Season", &request.outfit_season),
        ("Style", &request.outfit_style),
    ];
    for (label, value) in fields {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            lines.push(format!("{}: {}\n", label, v));
        }
    }

    lines.concat()
}

/// Prompt variant for providers that reject structured image parts.
pub fn with_inline_image(prompt: &str, image_url: Option<&str>) -> String {
    match image_url.filter(|u| !u.is_empty()) {
        Some(url) => format!("{}\nImage URL: {}", prompt, url),
        None => prompt.to_string(),
    }
}
