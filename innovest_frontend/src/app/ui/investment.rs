use eframe::egui::{self, Color32, RichText};

use crate::app::{format_date, format_usd, state::InvestmentState, InnovestApp};

pub fn render(app: &mut InnovestApp, ui: &mut egui::Ui, state: &mut InvestmentState) {
    ui.horizontal(|ui| {
        if ui.button("← Back").clicked() {
            app.open_own_profile();
        }
        ui.heading("Investment");
        if state.loading {
            ui.add(egui::Spinner::new());
        }
    });
    ui.separator();

    if let Some(err) = &state.error {
        ui.colored_label(Color32::LIGHT_RED, format!("Error: {}", err));
        if ui.button("Retry").clicked() {
            crate::app::tasks::load_investment(
                app.api.clone(),
                app.tx.clone(),
                state.investment_id,
            );
            state.loading = true;
            state.error = None;
        }
        return;
    }

    let Some(investment) = state.investment.clone() else {
        return;
    };

    egui::ScrollArea::vertical().show(ui, |ui| {
        egui::Frame::group(ui.style())
            .fill(ui.visuals().extreme_bg_color)
            .inner_margin(egui::vec2(12.0, 12.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());

                if let Some(post) = &investment.post {
                    if let Some(title) = &post.title {
                        ui.label(RichText::new(title).strong().size(18.0));
                    }
                    if let Some(description) = &post.description {
                        ui.label(RichText::new(description).weak());
                    }
                    ui.add_space(8.0);
                }

                ui.label(RichText::new("Total Investment").size(10.0).weak());
                ui.label(RichText::new(format_usd(investment.amount)).strong().size(22.0));

                ui.add_space(8.0);
                let total_used = state.total_used();
                let percentage = state.usage_percentage();
                ui.horizontal(|ui| {
                    ui.label(RichText::new("Fund Usage").strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            RichText::new(format!(
                                "{} / {}",
                                format_usd(total_used),
                                format_usd(investment.amount)
                            ))
                            .weak(),
                        );
                    });
                });
                ui.add(
                    egui::ProgressBar::new((percentage / 100.0) as f32).show_percentage(),
                );

                ui.add_space(8.0);
                ui.columns(2, |columns| {
                    columns[0].label(RichText::new("Investor").size(10.0).weak());
                    columns[0].label(
                        investment
                            .investor
                            .as_ref()
                            .map(|p| p.display_name())
                            .unwrap_or("Unknown"),
                    );
                    columns[1].label(RichText::new("Innovator").size(10.0).weak());
                    columns[1].label(
                        investment
                            .innovator
                            .as_ref()
                            .map(|p| p.display_name())
                            .unwrap_or("Unknown"),
                    );
                });
            });

        ui.add_space(12.0);
        ui.heading("Milestones & Updates");
        ui.add_space(6.0);

        if state.updates.is_empty() && !state.loading {
            ui.label(RichText::new("No updates yet").italics());
        }

        for update in &state.updates {
            egui::Frame::group(ui.style())
                .fill(ui.visuals().extreme_bg_color)
                .inner_margin(egui::vec2(12.0, 8.0))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(update.title.as_deref().unwrap_or("Update")).strong(),
                        );
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if let Some(progress) = update.progress_percentage {
                                ui.label(RichText::new(format!("{:.0}%", progress)).strong());
                            }
                        });
                    });
                    if let Some(description) = &update.description {
                        ui.label(RichText::new(description).weak());
                    }
                    if let Some(amount_used) = update.amount_used {
                        ui.label(format!("Amount used: {}", format_usd(amount_used)));
                    }
                    ui.label(RichText::new(format_date(update.created_at)).size(10.0).weak());
                });
            ui.add_space(6.0);
        }
    });
}
