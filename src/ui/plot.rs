use std::ops::RangeInclusive;

use chrono::NaiveDate;
use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{
    uniform_grid_spacer, Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line,
    MarkerShape, Plot, PlotPoints, Points,
};

use crate::color::{box_fills, month_colors, FLIER_COLOR, LINE_COLOR};
use crate::data::aggregate::{group_by_month, group_by_year, line_points, monthly_averages};
use crate::data::model::{FilteredSeries, MONTHS};
use crate::data::stats::BoxStats;
use crate::export::ChartKind;

pub const LINE_TITLE: &str = "Daily freeCodeCamp Forum Page Views 5/2016-12/2019";
pub const YEAR_BOX_TITLE: &str = "Year-wise Box Plot (Trend)";
pub const MONTH_BOX_TITLE: &str = "Month-wise Box Plot (Seasonality)";

/// Upper end of the box plot value axis.
const BOX_Y_MAX: f64 = 200_000.0;

/// Total width of one year's group of twelve bars, in x units.
const BAR_GROUP_WIDTH: f64 = 0.8;

// ---------------------------------------------------------------------------
// Central panel dispatch
// ---------------------------------------------------------------------------

/// Render `chart` for `filtered`, or a hint when nothing is loaded.
pub fn chart_panel(ui: &mut Ui, chart: ChartKind, filtered: Option<&FilteredSeries>) {
    let Some(filtered) = filtered else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to chart page views  (File → Open…)");
        });
        return;
    };

    match chart {
        ChartKind::Line => line_chart(ui, filtered),
        ChartKind::Bar => bar_chart(ui, filtered),
        ChartKind::Box => box_plots(ui, filtered),
    }
}

fn title(ui: &mut Ui, text: &str) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.label(RichText::new(text).size(14.0).color(Color32::from_gray(70)));
    });
}

/// Calendar date for a line chart x coordinate.
fn day_from_x(x: f64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

/// Label for integer category positions `0..labels.len()`, blank elsewhere.
fn category_label(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Line chart
// ---------------------------------------------------------------------------

/// Daily values over time.
pub fn line_chart(ui: &mut Ui, filtered: &FilteredSeries) {
    title(ui, LINE_TITLE);

    let points: PlotPoints = line_points(filtered).into_iter().collect();
    let line = Line::new(points)
        .name("Page Views")
        .color(LINE_COLOR)
        .width(1.2);

    Plot::new("line_plot")
        .x_axis_label("Date")
        .y_axis_label("Page Views")
        .x_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| {
            day_from_x(mark.value)
                .map(|d| d.format("%Y-%m").to_string())
                .unwrap_or_default()
        })
        .label_formatter(|_name, point| match day_from_x(point.x) {
            Some(day) => format!("{day}\n{:.0}", point.y),
            None => String::new(),
        })
        .include_y(0.0)
        .show(ui, |plot_ui| plot_ui.line(line));
}

// ---------------------------------------------------------------------------
// Monthly average bar chart
// ---------------------------------------------------------------------------

/// One group per year, one bar per month with data, legend January..December.
pub fn bar_chart(ui: &mut Ui, filtered: &FilteredSeries) {
    let table = monthly_averages(filtered);
    let years = table.years();
    let colors = month_colors();
    let bar_width = BAR_GROUP_WIDTH / 12.0;

    // One BarChart per month so the legend lists months, not years.
    let charts: Vec<BarChart> = MONTHS
        .iter()
        .enumerate()
        .map(|(m, month)| {
            let offset = (m as f64 - 5.5) * bar_width;
            let bars: Vec<Bar> = years
                .iter()
                .enumerate()
                .filter_map(|(i, &year)| {
                    let mean = table.get(year, *month)?;
                    Some(
                        Bar::new(i as f64 + offset, mean)
                            .width(bar_width)
                            .name(format!("{} {year}", month.name())),
                    )
                })
                .collect();
            BarChart::new(bars).name(month.name()).color(colors[m])
        })
        .collect();

    let year_labels: Vec<String> = years.iter().map(|y| y.to_string()).collect();

    Plot::new("bar_plot")
        .legend(Legend::default().position(egui_plot::Corner::LeftTop))
        .x_axis_label("Years")
        .y_axis_label("Average Page Views")
        .x_grid_spacer(uniform_grid_spacer(|_| [1.0, 5.0, 10.0]))
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            category_label(&year_labels, mark.value)
        })
        .include_y(0.0)
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

// ---------------------------------------------------------------------------
// Box plots
// ---------------------------------------------------------------------------

/// Year-wise and month-wise distributions side by side.
pub fn box_plots(ui: &mut Ui, filtered: &FilteredSeries) {
    let by_year: Vec<(String, Vec<f64>)> = group_by_year(filtered)
        .into_iter()
        .map(|g| (g.label(), g.values))
        .collect();
    let by_month: Vec<(String, Vec<f64>)> = group_by_month(filtered)
        .into_iter()
        .map(|g| (g.label().to_string(), g.values))
        .collect();

    ui.columns(2, |columns| {
        category_box_plot(&mut columns[0], "year_box_plot", YEAR_BOX_TITLE, "Year", by_year);
        category_box_plot(&mut columns[1], "month_box_plot", MONTH_BOX_TITLE, "Month", by_month);
    });
}

/// One box per category at x = 0, 1, 2, ...; fliers drawn as hollow circles.
fn category_box_plot(
    ui: &mut Ui,
    id: &str,
    heading: &str,
    x_label: &str,
    categories: Vec<(String, Vec<f64>)>,
) {
    title(ui, heading);

    let fills = box_fills(categories.len());
    let labels: Vec<String> = categories.iter().map(|(label, _)| label.clone()).collect();

    let mut boxes = Vec::with_capacity(categories.len());
    let mut fliers = Vec::new();
    for (i, (label, values)) in categories.iter().enumerate() {
        let Some(stats) = BoxStats::from_values(values) else {
            continue;
        };
        let x = i as f64;
        boxes.push(
            BoxElem::new(
                x,
                BoxSpread::new(
                    stats.lower_whisker,
                    stats.q1,
                    stats.median,
                    stats.q3,
                    stats.upper_whisker,
                ),
            )
            .name(label)
            .box_width(0.6)
            .whisker_width(0.3)
            .fill(fills[i])
            .stroke(Stroke::new(0.5, Color32::DARK_GRAY)),
        );
        fliers.extend(stats.fliers.iter().map(|&v| [x, v]));
    }

    let flier_points: PlotPoints = fliers.into_iter().collect();
    let markers = Points::new(flier_points)
        .name("Outliers")
        .shape(MarkerShape::Circle)
        .radius(1.5)
        .filled(false)
        .color(FLIER_COLOR);

    Plot::new(id)
        .x_axis_label(x_label)
        .y_axis_label("Page Views")
        .x_grid_spacer(uniform_grid_spacer(|_| [1.0, 5.0, 10.0]))
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            category_label(&labels, mark.value)
        })
        .include_y(0.0)
        .include_y(BOX_Y_MAX)
        .show(ui, |plot_ui| {
            plot_ui.box_plot(BoxPlot::new(boxes));
            plot_ui.points(markers);
        });
}
