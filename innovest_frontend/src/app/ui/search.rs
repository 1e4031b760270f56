use eframe::egui::{self, Color32, RichText};

use crate::app::{
    state::{sort_posts, SearchSort, SearchState},
    InnovestApp,
};

use super::post_card;

const CATEGORIES: [&str; 5] = ["Technology", "Health", "Education", "Finance", "Environment"];

pub fn render(app: &mut InnovestApp, ui: &mut egui::Ui, state: &mut SearchState) {
    ui.horizontal(|ui| {
        if ui.button("← Back").clicked() {
            app.open_feed();
        }
        ui.heading("Search");
        if state.searching {
            ui.add(egui::Spinner::new());
        }
    });
    ui.separator();

    let search_box = ui.add(
        egui::TextEdit::singleline(&mut state.query)
            .hint_text("Search ideas...")
            .desired_width(f32::INFINITY),
    );
    let mut fetch = search_box.has_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

    ui.add_space(4.0);

    // Category filter; switching refetches with the new filter applied.
    ui.horizontal_wrapped(|ui| {
        if ui
            .selectable_label(state.category.is_none(), "All")
            .clicked()
        {
            state.category = None;
            fetch = true;
        }
        for category in CATEGORIES {
            let selected = state.category.as_deref() == Some(category);
            if ui.selectable_label(selected, category).clicked() {
                state.category = Some(category.to_string());
                fetch = true;
            }
        }
    });

    // Sort applies to whatever is already loaded.
    ui.horizontal(|ui| {
        ui.label(RichText::new("Sort:").weak());
        for sort in [SearchSort::Reactions, SearchSort::Recent] {
            if ui
                .selectable_value(&mut state.sort, sort, sort.label())
                .clicked()
            {
                sort_posts(&mut state.posts, state.sort);
            }
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Search").clicked() {
                fetch = true;
            }
        });
    });

    if fetch && !state.searching {
        app.spawn_search(state);
    }

    ui.separator();

    if let Some(err) = &state.error {
        ui.colored_label(Color32::LIGHT_RED, format!("Error: {}", err));
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        if state.posts.is_empty() && !state.searching {
            let hint = if state.searched {
                "No results found"
            } else {
                "Enter a search query"
            };
            ui.label(RichText::new(hint).italics());
        }

        let mut action = None;
        for post in &state.posts {
            let liked = state.liked.contains(&post.id);
            let busy = state.like_in_flight.contains(&post.id);
            if let Some(taken) = post_card::render(app, ui, post, liked, busy) {
                action = Some(taken);
            }
            ui.add_space(8.0);
        }
        if let Some(action) = action {
            post_card::apply_action(app, &mut state.like_in_flight, action);
        }
    });
}
