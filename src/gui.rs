//! Native landscape viewer using egui
//!
//! Scatter plot of the active point cloud with cluster-box overlays,
//! a legend panel, free-text/year filtering and a detail side panel with
//! nearest neighbors. Data loads run on the tokio runtime and come back
//! over a channel; every load carries a generation id and stale results
//! are dropped, so a superseded load can never overwrite newer state.

use eframe::egui;
use std::collections::{BTreeMap, HashMap};
use std::sync::{mpsc, Arc};
use tracing::{error, info};

use crate::adapters::Issue;
use crate::detail::DetailDisplayModel;
use crate::filter::{available_years, FilterState};
use crate::issue_config::IssueConfigEntry;
use crate::knn::{k_nearest, Neighbor};
use crate::legend::LegendBundle;
use crate::model::cluster_type;
use crate::store::{LandscapeStore, LoadTracker};
use crate::view::{detail_view_model, ClusterOverlay, PointCloudPoint};

const NEIGHBOR_COUNT: usize = 5;
const DEFAULT_VERSION: u32 = 32;
/// Click-to-point hit threshold as a fraction of the visible plot width.
const HIT_RADIUS_FRACTION: f64 = 0.02;

/// Run the native viewer. Must be called from within a tokio runtime;
/// loads are spawned onto it.
pub fn run_viewer(base: String, issue: Issue) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_title("EDC Landscape"),
        ..Default::default()
    };

    let runtime = tokio::runtime::Handle::current();
    eframe::run_native(
        "EDC Landscape",
        options,
        Box::new(move |_cc| Ok(Box::new(LandscapeApp::new(base, issue, runtime)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {}", e))
}

struct LoadedData {
    generation: u64,
    entry: IssueConfigEntry,
    points: Vec<PointCloudPoint>,
    overlays: Vec<ClusterOverlay>,
    cluster_mapping: HashMap<String, String>,
}

enum LoadMessage {
    Loaded(Box<LoadedData>),
    Failed {
        generation: u64,
        message: String,
        /// Present when the manifest entry itself loaded fine, so the
        /// selectors can still switch to the failing issue's options.
        entry: Option<IssueConfigEntry>,
    },
}

struct LandscapeApp {
    store: Arc<LandscapeStore>,
    runtime: tokio::runtime::Handle,
    tx: mpsc::Sender<LoadMessage>,
    rx: mpsc::Receiver<LoadMessage>,

    loads: LoadTracker,
    loading: bool,
    load_error: Option<String>,

    issue: Issue,
    cluster_type: String,
    version: u32,

    entry: Option<IssueConfigEntry>,
    points: Vec<PointCloudPoint>,
    overlays: Vec<ClusterOverlay>,
    legend: Option<LegendBundle<PointCloudPoint, String>>,
    filter: FilterState,
    years: Vec<i32>,

    selected: Option<String>,
    neighbors: Vec<Neighbor>,

    show_overlays: bool,
    point_radius: f32,
}

impl LandscapeApp {
    fn new(base: String, issue: Issue, runtime: tokio::runtime::Handle) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut app = Self {
            store: Arc::new(LandscapeStore::new(base)),
            runtime,
            tx,
            rx,
            loads: LoadTracker::default(),
            loading: false,
            load_error: None,
            issue,
            cluster_type: cluster_type::ABSTRACT.to_string(),
            version: DEFAULT_VERSION,
            entry: None,
            points: Vec::new(),
            overlays: Vec::new(),
            legend: None,
            filter: FilterState::default(),
            years: Vec::new(),
            selected: None,
            neighbors: Vec::new(),
            show_overlays: true,
            point_radius: 2.5,
        };
        app.request_load(None);
        app
    }

    /// Start an async load for the current selection. A previous load in
    /// flight keeps running but its result will be discarded.
    fn request_load(&mut self, ctx: Option<&egui::Context>) {
        let generation = self.loads.begin();
        self.loading = true;
        self.load_error = None;
        let store = Arc::clone(&self.store);
        let issue = self.issue;
        let selected_type = self.cluster_type.clone();
        let ver = self.version;
        let tx = self.tx.clone();
        let ctx = ctx.cloned();

        info!(
            issue = %issue,
            cluster_type = %selected_type,
            ver,
            generation,
            "requesting data load"
        );
        self.runtime.spawn(async move {
            let message = match store.issue_entry(issue).await {
                Ok(entry) => {
                    match load_dataset(&store, issue, &selected_type, ver, generation, entry.clone())
                        .await
                    {
                        Ok(data) => LoadMessage::Loaded(Box::new(data)),
                        Err(e) => LoadMessage::Failed {
                            generation,
                            message: e.to_string(),
                            entry: Some(entry),
                        },
                    }
                }
                Err(e) => LoadMessage::Failed {
                    generation,
                    message: e.to_string(),
                    entry: None,
                },
            };
            let _ = tx.send(message);
            if let Some(ctx) = ctx {
                ctx.request_repaint();
            }
        });
    }

    fn apply_loaded(&mut self, data: LoadedData) {
        let LoadedData {
            entry,
            points,
            overlays,
            cluster_mapping,
            ..
        } = data;

        self.years = available_years(&points);
        self.filter.selected_years = self.years.iter().copied().collect();

        // Color points by their abstract cluster; unmapped stems get the
        // catch-all label.
        let mapping = cluster_mapping;
        self.legend = Some(LegendBundle::new("種類別", &points, move |p: &PointCloudPoint| {
            mapping
                .get(&p.filestem)
                .cloned()
                .unwrap_or_else(|| "その他".to_string())
        }));

        self.entry = Some(entry);
        self.points = points;
        self.overlays = overlays;
        self.selected = None;
        self.neighbors.clear();
        self.loading = false;
    }

    fn drain_load_messages(&mut self, ctx: &egui::Context) {
        while let Ok(message) = self.rx.try_recv() {
            match message {
                LoadMessage::Loaded(data) => {
                    if !self.loads.is_current(data.generation) {
                        info!(generation = data.generation, "dropping stale load result");
                        continue;
                    }
                    info!(points = data.points.len(), "load applied");
                    self.apply_loaded(*data);
                }
                LoadMessage::Failed {
                    generation,
                    message,
                    entry,
                } => {
                    if !self.loads.is_current(generation) {
                        continue;
                    }
                    error!("data load failed: {}", message);
                    self.load_error = Some(message);
                    self.loading = false;
                    if let Some(entry) = entry {
                        // A clustering selection carried over from another
                        // issue can name files this issue does not have;
                        // snap to the entry's options and retry once.
                        let changed = reconcile_selection(
                            &entry,
                            &mut self.cluster_type,
                            &mut self.version,
                        );
                        self.entry = Some(entry);
                        if changed {
                            self.request_load(Some(ctx));
                        }
                    }
                }
            }
        }
    }

    fn select_point(&mut self, point_id: &str) {
        let Some(target) = self.points.iter().find(|p| p.point_id == point_id) else {
            return;
        };
        self.neighbors = k_nearest(&self.points, target, NEIGHBOR_COUNT);
        self.selected = Some(point_id.to_string());
    }

    fn detail_model(&self) -> DetailDisplayModel {
        DetailDisplayModel::for_issue(self.issue)
    }

    fn controls_panel(&mut self, ctx: &egui::Context) {
        let mut reload = false;

        egui::SidePanel::left("controls_panel")
            .min_width(230.0)
            .show(ctx, |ui| {
                ui.heading("EDC Landscape");
                ui.separator();

                ui.horizontal(|ui| {
                    ui.label("Issue:");
                    let old_issue = self.issue;
                    egui::ComboBox::from_id_salt("issue")
                        .selected_text(self.issue.as_str())
                        .show_ui(ui, |ui| {
                            for issue in Issue::ALL {
                                ui.selectable_value(&mut self.issue, issue, issue.as_str());
                            }
                        });
                    if self.issue != old_issue {
                        reload = true;
                    }
                });

                if let Some(entry) = self.entry.clone() {
                    ui.horizontal(|ui| {
                        ui.label("Clustering:");
                        let old_type = self.cluster_type.clone();
                        let selected_label = entry
                            .type_options
                            .iter()
                            .find(|o| o.value == self.cluster_type)
                            .map(|o| o.label.clone())
                            .unwrap_or_else(|| self.cluster_type.clone());
                        egui::ComboBox::from_id_salt("cluster_type")
                            .selected_text(selected_label)
                            .show_ui(ui, |ui| {
                                for option in &entry.type_options {
                                    ui.selectable_value(
                                        &mut self.cluster_type,
                                        option.value.clone(),
                                        &option.label,
                                    );
                                }
                            });
                        if self.cluster_type != old_type {
                            reload = true;
                        }
                    });

                    if !entry.cluster_options.is_empty() {
                        ui.horizontal(|ui| {
                            ui.label("Clusters:");
                            let old_version = self.version;
                            egui::ComboBox::from_id_salt("cluster_version")
                                .selected_text(self.version.to_string())
                                .show_ui(ui, |ui| {
                                    for option in &entry.cluster_options {
                                        ui.selectable_value(
                                            &mut self.version,
                                            *option,
                                            option.to_string(),
                                        );
                                    }
                                });
                            if self.version != old_version {
                                reload = true;
                            }
                        });
                    }
                }

                ui.separator();

                ui.label("検索:");
                ui.text_edit_singleline(&mut self.filter.query);

                ui.add_space(4.0);
                ui.label("発行年:");
                for year in self.years.clone() {
                    let mut checked = self.filter.selected_years.contains(&year);
                    if ui.checkbox(&mut checked, year.to_string()).changed() {
                        if checked {
                            self.filter.selected_years.insert(year);
                        } else {
                            self.filter.selected_years.remove(&year);
                        }
                    }
                }

                ui.separator();
                ui.checkbox(&mut self.show_overlays, "Cluster boxes");
                ui.add(egui::Slider::new(&mut self.point_radius, 1.0..=6.0).text("Point size"));

                ui.separator();
                if let Some(legend) = &self.legend {
                    ui.label(format!("凡例 ({})", legend.name()));
                    egui::ScrollArea::vertical()
                        .id_salt("legend_scroll")
                        .max_height(260.0)
                        .show(ui, |ui| {
                            for (label, color) in legend.label_colors() {
                                ui.horizontal(|ui| {
                                    ui.colored_label(parse_hsl_color(color), "●");
                                    ui.label(label);
                                });
                            }
                        });
                }

                if self.loading {
                    ui.separator();
                    ui.spinner();
                    ui.label("データをロード中...");
                }
                if let Some(message) = &self.load_error {
                    ui.separator();
                    ui.colored_label(egui::Color32::LIGHT_RED, message);
                }
            });

        if reload {
            self.request_load(Some(ctx));
        }
    }

    fn detail_panel(&mut self, ctx: &egui::Context) {
        let mut select_next: Option<String> = None;

        egui::SidePanel::right("detail_panel")
            .min_width(300.0)
            .show(ctx, |ui| {
                let Some(selected_id) = self.selected.clone() else {
                    ui.label("点をクリックすると詳細が表示されます");
                    return;
                };
                let Some(point) = self.points.iter().find(|p| p.point_id == selected_id) else {
                    return;
                };
                let model = self.detail_model();
                let detail = detail_view_model(point, model);

                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.heading(&detail.title);
                    ui.label(format!("種類: {}", detail.type_label));
                    ui.separator();

                    for row in &detail.summary_rows {
                        ui.label(format!("{}: {}", row.label, row.value));
                    }
                    if !detail.context_items.is_empty() {
                        ui.add_space(4.0);
                        ui.label("文脈:");
                        for item in &detail.context_items {
                            ui.label(format!("・{item}"));
                        }
                    }
                    if let Some(approach) = &detail.approach_text {
                        ui.add_space(4.0);
                        ui.label(format!("アプローチ: {approach}"));
                    }

                    ui.separator();
                    ui.hyperlink_to(&detail.paper_title, &detail.paper_url);
                    if !detail.paper_abstract.is_empty() {
                        ui.add_space(4.0);
                        ui.label(egui::RichText::new(&detail.paper_abstract).small());
                    }

                    if !self.neighbors.is_empty() {
                        ui.separator();
                        ui.label("近傍の点:");
                        for neighbor in &self.neighbors {
                            let Some(p) = self.points.get(neighbor.idx) else {
                                continue;
                            };
                            let neighbor_detail = detail_view_model(p, model);
                            let text = format!(
                                "{} ({:.2})",
                                truncate_label(&neighbor_detail.title, 40),
                                neighbor.dist
                            );
                            if ui.link(text).clicked() {
                                select_next = Some(p.point_id.clone());
                            }
                        }
                    }
                });
            });

        if let Some(point_id) = select_next {
            self.select_point(&point_id);
        }
    }

    fn plot_panel(&mut self, ctx: &egui::Context) {
        let mut clicked_id: Option<String> = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            let visible: Vec<&PointCloudPoint> = self.filter.apply(&self.points);

            let plot = egui_plot::Plot::new("landscape_plot")
                .data_aspect(1.0)
                .allow_drag(true)
                .allow_zoom(true)
                .allow_scroll(true)
                .show_grid(false);

            plot.show(ui, |plot_ui| {
                if let Some(legend) = &self.legend {
                    // One series per label so each keeps its legend color.
                    let mut by_label: BTreeMap<String, Vec<[f64; 2]>> = BTreeMap::new();
                    for point in &visible {
                        by_label
                            .entry(legend.label(point))
                            .or_default()
                            .push([point.x, point.y]);
                    }
                    for (label, coords) in by_label {
                        let color = legend
                            .label_color(&label)
                            .map(parse_hsl_color)
                            .unwrap_or(egui::Color32::GRAY);
                        plot_ui.points(
                            egui_plot::Points::new(egui_plot::PlotPoints::from(coords))
                                .color(color)
                                .radius(self.point_radius)
                                .name(label),
                        );
                    }
                }

                if let Some(selected_id) = &self.selected {
                    if let Some(p) = self.points.iter().find(|p| &p.point_id == selected_id) {
                        plot_ui.points(
                            egui_plot::Points::new(egui_plot::PlotPoints::from(vec![[p.x, p.y]]))
                                .color(egui::Color32::WHITE)
                                .radius(self.point_radius + 2.0)
                                .shape(egui_plot::MarkerShape::Circle),
                        );
                    }
                }

                if self.show_overlays {
                    for overlay in &self.overlays {
                        let corners = vec![
                            [overlay.x_min, overlay.y_min],
                            [overlay.x_max, overlay.y_min],
                            [overlay.x_max, overlay.y_max],
                            [overlay.x_min, overlay.y_max],
                            [overlay.x_min, overlay.y_min],
                        ];
                        plot_ui.line(
                            egui_plot::Line::new(egui_plot::PlotPoints::from(corners))
                                .color(egui::Color32::from_gray(150))
                                .width(1.0),
                        );
                        plot_ui.text(egui_plot::Text::new(
                            egui_plot::PlotPoint::new(overlay.x_min, overlay.y_max),
                            egui::RichText::new(overlay.name.clone()).size(12.0),
                        ));
                    }
                }

                // Click selection: nearest visible point within a small
                // fraction of the current view width.
                if plot_ui.response().clicked() {
                    if let Some(pointer) = plot_ui.pointer_coordinate() {
                        let threshold = plot_ui.plot_bounds().width() * HIT_RADIUS_FRACTION;
                        let nearest = visible
                            .iter()
                            .map(|p| {
                                let dist = (p.x - pointer.x).hypot(p.y - pointer.y);
                                (p, dist)
                            })
                            .min_by(|a, b| a.1.total_cmp(&b.1));
                        if let Some((point, dist)) = nearest {
                            if dist <= threshold {
                                clicked_id = Some(point.point_id.clone());
                            }
                        }
                    }
                }
            });
        });

        if let Some(point_id) = clicked_id {
            self.select_point(&point_id);
        }
    }
}

impl eframe::App for LandscapeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());
        self.drain_load_messages(ctx);

        self.controls_panel(ctx);
        self.detail_panel(ctx);
        self.plot_panel(ctx);

        if self.loading {
            // Poll for load results while a fetch is in flight.
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

async fn load_dataset(
    store: &LandscapeStore,
    issue: Issue,
    selected_type: &str,
    ver: u32,
    generation: u64,
    entry: IssueConfigEntry,
) -> Result<LoadedData, crate::adapters::AdapterError> {
    let points = store.point_cloud(issue, selected_type, ver).await?;
    let overlays = store.cluster_overlays(issue, selected_type, ver).await?;
    let cluster_mapping = store.abstract_cluster_mapping(issue).await?;
    Ok(LoadedData {
        generation,
        entry,
        points,
        overlays,
        cluster_mapping,
    })
}

/// Snap a clustering selection to options the manifest entry actually
/// offers. Returns true when either value changed.
fn reconcile_selection(
    entry: &IssueConfigEntry,
    cluster_type: &mut String,
    version: &mut u32,
) -> bool {
    let mut changed = false;
    if !entry.type_options.iter().any(|o| o.value == *cluster_type) {
        if let Some(first) = entry.type_options.first() {
            *cluster_type = first.value.clone();
            changed = true;
        }
    }
    if !entry.cluster_options.contains(version) {
        if let Some(first) = entry.cluster_options.first() {
            *version = *first;
            changed = true;
        }
    }
    changed
}

/// Parse an `hsl(h, s%, l%)` legend color into an egui color. Non-HSL
/// strings (hex palettes) are handled too; anything else renders gray.
fn parse_hsl_color(color: &str) -> egui::Color32 {
    if let Some(body) = color
        .strip_prefix("hsl(")
        .and_then(|s| s.strip_suffix(')'))
    {
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() == 3 {
            let h: f32 = parts[0].parse().unwrap_or(0.0);
            let s: f32 = parts[1].trim_end_matches('%').parse().unwrap_or(0.0);
            let l: f32 = parts[2].trim_end_matches('%').parse().unwrap_or(0.0);
            return hsl_to_color32(h, s / 100.0, l / 100.0);
        }
    }
    if let Some(hex) = color.strip_prefix('#') {
        if hex.len() == 6 {
            if let Ok(value) = u32::from_str_radix(hex, 16) {
                return egui::Color32::from_rgb(
                    ((value >> 16) & 0xff) as u8,
                    ((value >> 8) & 0xff) as u8,
                    (value & 0xff) as u8,
                );
            }
        }
    }
    egui::Color32::GRAY
}

fn hsl_to_color32(h: f32, s: f32, l: f32) -> egui::Color32 {
    let h = h.rem_euclid(360.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;
    let (r, g, b) = match h as u32 {
        0..=59 => (c, x, 0.0),
        60..=119 => (x, c, 0.0),
        120..=179 => (0.0, c, x),
        180..=239 => (0.0, x, c),
        240..=299 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    egui::Color32::from_rgb(
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}

fn truncate_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}
