use crate::models::FormState;

pub const STORY: &str = include_str!("../data/prompts/story.txt");
pub const IMAGE_DESCRIPTION: &str = include_str!("../data/prompts/image_description.txt");

/// Replace `{{key}}` placeholders in a template string.
///
/// Substituted values are never rescanned, so user text containing `{{...}}`
/// passes through untouched. Unknown placeholders are left as-is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(end) = after_open.find("}}") else {
            result.push_str(&rest[start..]);
            return result;
        };

        let key = &after_open[..end];
        match vars.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => result.push_str(value),
            None => result.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after_open[end + 2..];
    }

    result.push_str(rest);
    result
}

/// Story request built from all eight form fields.
pub fn build_story_prompt(form: &FormState) -> String {
    let age1 = form.character1.age.to_string();
    let age2 = form.character2.age.to_string();

    render(
        STORY,
        &[
            ("character1_name", &form.character1.name),
            ("character1_age", &age1),
            ("character1_type", form.character1.kind.label()),
            ("character2_name", &form.character2.name),
            ("character2_age", &age2),
            ("character2_type", form.character2.kind.label()),
            ("story_location", form.location.label()),
            ("story_type", form.genre.label()),
        ],
    )
}

/// Asks the text model to describe an illustration for `story`.
pub fn build_image_prompt(story: &str) -> String {
    render(IMAGE_DESCRIPTION, &[("story", story)])
}
