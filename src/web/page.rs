//! HTML rendering for the single story page.

use crate::app::RenderedStory;
use crate::form::{FormController, FormField};
use crate::models::{CharacterKind, StoryGenre, StoryLocation, MAX_AGE, MIN_AGE};
use crate::prompts;
use std::fmt::Write;

const PAGE: &str = include_str!("../../data/templates/page.html");

/// Escape text for use in HTML bodies and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn select(field: FormField, label: &str, options: &[&str], selected: &str) -> String {
    let mut html = format!(
        "<label>{}<select name=\"{}\">",
        escape_html(label),
        field.key()
    );
    for option in options {
        let marker = if *option == selected { " selected" } else { "" };
        let _ = write!(
            html,
            "<option{}>{}</option>",
            marker,
            escape_html(option)
        );
    }
    html.push_str("</select></label>");
    html
}

fn character_fields(controller: &FormController, index: usize) -> String {
    let Some(character) = controller.character(index) else {
        return String::new();
    };
    let (name_field, age_field, kind_field) = if index == 1 {
        (
            FormField::Character1Name,
            FormField::Character1Age,
            FormField::Character1Kind,
        )
    } else {
        (
            FormField::Character2Name,
            FormField::Character2Age,
            FormField::Character2Kind,
        )
    };
    let kinds: Vec<&str> = CharacterKind::ALL.iter().map(|k| k.label()).collect();

    format!(
        "<fieldset><legend>Character {index}</legend>\
         <label>Name<input type=\"text\" name=\"{}\" value=\"{}\" required></label>\
         <label>Age<input type=\"number\" name=\"{}\" value=\"{}\" min=\"{MIN_AGE}\" max=\"{MAX_AGE}\" step=\"1\" required></label>\
         {}</fieldset>",
        name_field.key(),
        escape_html(&character.name),
        age_field.key(),
        character.age,
        select(kind_field, "Character is a...", &kinds, character.kind.label()),
    )
}

fn form_html(controller: &FormController) -> String {
    let state = controller.state();
    let locations: Vec<&str> = StoryLocation::ALL.iter().map(|l| l.label()).collect();
    let genres: Vec<&str> = StoryGenre::ALL.iter().map(|g| g.label()).collect();

    format!(
        "<form method=\"post\" action=\"/generate\">{}{}\
         <fieldset><legend>Story Elements</legend>{}{}</fieldset>\
         <button type=\"submit\">Generate my story</button></form>",
        character_fields(controller, 1),
        character_fields(controller, 2),
        select(
            FormField::StoryLocation,
            "Where does the story take place?",
            &locations,
            state.location.label()
        ),
        select(
            FormField::StoryGenre,
            "What type of story is it?",
            &genres,
            state.genre.label()
        ),
    )
}

fn output_html(rendered: &RenderedStory, error: Option<&str>) -> String {
    let mut html = String::new();
    if let Some(story) = &rendered.story {
        html.push_str("<section class=\"story\">");
        for paragraph in story.split("\n\n").filter(|p| !p.trim().is_empty()) {
            let _ = write!(html, "<p>{}</p>", escape_html(paragraph.trim()));
        }
        html.push_str("</section>");
    }
    if let Some(url) = &rendered.image_url {
        let _ = write!(
            html,
            "<img class=\"illustration\" src=\"{}\" alt=\"Story illustration\">",
            escape_html(url)
        );
    }
    if let Some(message) = error {
        let _ = write!(html, "<p class=\"error\">{}</p>", escape_html(message));
    }
    html
}

/// Full page: the form with its current values, then any output.
pub fn render_page(
    controller: &FormController,
    rendered: &RenderedStory,
    error: Option<&str>,
) -> String {
    prompts::render(
        PAGE,
        &[
            ("form", &form_html(controller)),
            ("output", &output_html(rendered, error)),
        ],
    )
}
