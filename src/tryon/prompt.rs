use serde_json::json;

const DEFAULT_NOTE: &str = "Apply the garment realistically over the model image.";

/// Fitting hint for the garment category, matched case-insensitively.
pub fn garment_note(garment_type: &str) -> &'static str {
    match garment_type.trim().to_lowercase().as_str() {
        "saree" => "Ensure realistic draping from shoulder to foot, and match folds with body pose. Do not crop or misalign the pallu.",
        "churidar" => "Fit the garment along the legs with tight ankle fitting and tunic on top. Avoid overlapping distortions.",
        "skirt" => "Ensure waist-level fitting with correct flare, length, and folds aligned to posture.",
        "coat" => "Layer the coat over existing clothing or upper body with realistic overlap and sleeve alignment.",
        "shirt" => "Fit naturally on torso with collar, sleeve and hem properly aligned.",
        "tshirt" => "Match torso tightly and preserve shoulder seams.",
        "pants" => "Follow leg contours and match ankle length.",
        "dress" => "Render from shoulders to knees/ankle with natural fall.",
        "jacket" => "Overlay the torso with zip/button alignment preserved.",
        _ => DEFAULT_NOTE,
    }
}

#[derive(Debug, Default, Clone)]
pub struct PromptTags<'a> {
    pub model_type: &'a str,
    pub gender: &'a str,
    pub garment_type: &'a str,
    pub style: &'a str,
    pub instructions: Option<&'a str>,
}

/// Structured JSON brief for the image model. The person image is `input_1`,
/// the garment image `input_2`.
pub fn build(tags: &PromptTags<'_>) -> String {
    let instructions = tags
        .instructions
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("None");

    let brief = json!({
        "objective": "Generate a realistic virtual try-on image where the clothing from 'garment_image' is transferred onto the person in 'person_image', preserving the face, pose, and background of the original image perfectly.",
        "task": "Virtual Try-On with Identity and Background Preservation",
        "inputs": {
            "person_image": {
                "description": "Image of a real person. The output must retain the full face, expression, and original background exactly as in this image. Do not replace, reconstruct, or modify the face or background.",
                "id": "input_1"
            },
            "garment_image": {
                "description": "Image of the garment (flat lay, mannequin, or modeled). Extract only the garment texture, color, and style. Discard original garment image background or mannequin.",
                "id": "input_2"
            }
        },
        "processing_steps": [
            "Segment and extract garment from garment_image (input_2) with high fidelity.",
            "Analyze the person_image (input_1) to detect pose, body region, and position to fit the garment.",
            "Retain and protect all facial features, hair, and background elements from the original person_image.",
            "Overlay the extracted garment onto the person, ensuring natural drape, folds, and lighting consistency with the person_image.",
            "Do not alter the background or generate a new one.",
            garment_note(tags.garment_type)
        ],
        "output_requirements": {
            "description": "Generate a realistic image of the person from person_image wearing the garment from garment_image. The face and background must be unchanged.",
            "format": "PNG or JPG",
            "quality": "High-resolution and photorealistic"
        },
        "core_constraints": {
            "identity_lock": {
                "priority": "ABSOLUTE",
                "instruction": "Face and head must be left exactly as in the original image (input1). No generation, replacement, or modification is allowed."
            },
            "garment_fidelity": {
                "priority": "CRITICAL",
                "instruction": "Maintain the exact visual properties (color, pattern, texture, style) of the garment."
            },
            "background_preservation": {
                "priority": "CRITICAL",
                "instruction": "Keep the exact background from the person_image. No generation or changes allowed."
            },
            "pose_alignment": {
                "priority": "HIGH",
                "instruction": "Ensure the garment adapts to the existing pose and body shape from the person_image."
            },
            "lighting_match": {
                "priority": "HIGH",
                "instruction": "Match lighting and shadows of the garment to the person_image so it looks naturally worn."
            }
        },
        "prohibitions": [
            "Do not change or regenerate the face or background.",
            "Do not modify garment design or color.",
            "Do not hallucinate body pose or garment geometry.",
            "Do not change the person's pose."
        ],
        "contextual_tags": {
            "Model Type": tags.model_type,
            "Gender": tags.gender,
            "Garment Type": tags.garment_type,
            "Style": tags.style,
            "Special Instructions": instructions
        },
        "output_caption": "Explain how the garment fits on the person, note realism and drape quality, and mention any visible misalignment."
    });

    serde_json::to_string_pretty(&brief).unwrap_or_else(|_| brief.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn known_garments_get_specific_notes() {
        assert!(garment_note("Saree").contains("pallu"));
        assert!(garment_note(" pants ").contains("leg contours"));
        assert_eq!(garment_note("kimono"), DEFAULT_NOTE);
        assert_eq!(garment_note(""), DEFAULT_NOTE);
    }

    #[test]
    fn prompt_is_valid_json_with_tags() {
        let text = build(&PromptTags {
            model_type: "studio",
            gender: "female",
            garment_type: "dress",
            style: "party",
            instructions: Some("  keep the necklace  "),
        });
        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["contextual_tags"]["Garment Type"], "dress");
        assert_eq!(v["contextual_tags"]["Special Instructions"], "keep the necklace");
        let steps = v["processing_steps"].as_array().unwrap();
        assert_eq!(steps.last().unwrap(), garment_note("dress"));
    }

    #[test]
    fn missing_instructions_read_none() {
        let v: Value = serde_json::from_str(&build(&PromptTags::default())).unwrap();
        assert_eq!(v["contextual_tags"]["Special Instructions"], "None");
        assert_eq!(v["inputs"]["person_image"]["id"], "input_1");
    }

    #[test]
    fn prompt_is_deterministic() {
        let tags = PromptTags {
            garment_type: "coat",
            ..Default::default()
        };
        assert_eq!(build(&tags), build(&tags));
    }
}
