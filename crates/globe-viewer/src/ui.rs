//! egui overlays: the loading HUD and the pin label layer.
//!
//! Label placement happens in `app`, which projects every labelled pin into
//! screen points each frame. This module only turns those batches into
//! widgets, so the globe pass never needs to know what a label looks like.

use egui::{Align2, Color32, FontFamily, FontId, RichText};
use globecore::{GlobeConfig, Pin, Stage};

/// One pin label, already projected into screen points.
pub struct LabelScreen {
    pub pin_index: usize,
    pub pos: egui::Pos2,
    pub visible: bool,
    pub title: String,
}

/// Gap between a marker's screen position and the name chip above it.
pub const LABEL_LIFT_PX: f32 = 16.0;

fn color32(rgb: [f32; 3]) -> Color32 {
    Color32::from_rgb(
        (rgb[0].clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb[1].clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb[2].clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

fn label_font(cfg: &GlobeConfig) -> FontId {
    let family = match cfg.label_font.as_str() {
        "monospace" => FontFamily::Monospace,
        _ => FontFamily::Proportional,
    };
    FontId::new(cfg.label_font_size, family)
}

/// Status readout in the top-left corner. Shows a progress bar until the
/// point clouds are ready, then point totals (and the pause state) after.
pub fn draw_hud(
    ctx: &egui::Context,
    stage: Stage,
    progress: f32,
    counts: Option<(usize, usize)>,
    paused: bool,
) {
    egui::Area::new(egui::Id::new("globe_hud"))
        .anchor(Align2::LEFT_TOP, [10.0, 10.0])
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                match stage {
                    Stage::Ready => {
                        if let Some((edge, fill)) = counts {
                            ui.label(format!("{edge} outline + {fill} fill points"));
                        }
                        if paused {
                            ui.label(RichText::new("paused (space resumes)").weak());
                        }
                    }
                    Stage::Failed => {
                        ui.label(RichText::new(stage.label()).color(Color32::LIGHT_RED));
                    }
                    _ => {
                        ui.label(stage.label());
                        ui.add(
                            egui::ProgressBar::new(progress)
                                .desired_width(160.0)
                                .show_percentage(),
                        );
                    }
                }
            });
        });
}

/// Draws the always-visible name chips plus, for the hovered or selected
/// pin, a detail popup with its address and phone. Clicking a chip keeps
/// the popup open until the chip is clicked again.
pub fn draw_pin_labels(
    ctx: &egui::Context,
    cfg: &GlobeConfig,
    pins: &[Pin],
    labels: &[LabelScreen],
    selected: &mut Option<usize>,
) {
    let font = label_font(cfg);
    let text_color = color32(cfg.label_color);

    for label in labels.iter().filter(|l| l.visible) {
        let Some(pin) = pins.get(label.pin_index) else {
            continue;
        };

        let chip_pos = egui::pos2(label.pos.x, label.pos.y - LABEL_LIFT_PX);
        let mut open = false;

        egui::Area::new(egui::Id::new(("pin_label", label.pin_index)))
            .order(egui::Order::Foreground)
            .pivot(Align2::CENTER_BOTTOM)
            .fixed_pos(chip_pos)
            .show(ctx, |ui| {
                let chip = egui::Frame::none()
                    .fill(Color32::from_black_alpha(160))
                    .rounding(4.0)
                    .inner_margin(egui::Margin::symmetric(6.0, 3.0))
                    .show(ui, |ui| {
                        ui.add(
                            egui::Label::new(
                                RichText::new(&label.title)
                                    .font(font.clone())
                                    .color(text_color),
                            )
                            .sense(egui::Sense::click()),
                        )
                    })
                    .inner;

                if chip.clicked() {
                    *selected = if *selected == Some(label.pin_index) {
                        None
                    } else {
                        Some(label.pin_index)
                    };
                }
                open = chip.hovered() || *selected == Some(label.pin_index);
            });

        let has_detail = pin.address.is_some() || pin.phone.is_some();
        if open && has_detail {
            egui::Area::new(egui::Id::new(("pin_detail", label.pin_index)))
                .order(egui::Order::Foreground)
                .pivot(Align2::CENTER_TOP)
                .fixed_pos(egui::pos2(label.pos.x, label.pos.y + 8.0))
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        if let Some(name) = &pin.name {
                            ui.label(RichText::new(name).font(font.clone()).strong());
                        }
                        if let Some(address) = &pin.address {
                            ui.label(RichText::new(address).font(font.clone()));
                        }
                        if let Some(phone) = &pin.phone {
                            ui.label(
                                RichText::new(phone)
                                    .font(font.clone())
                                    .color(Color32::LIGHT_BLUE),
                            );
                        }
                    });
                });
        }
    }
}
