//! Plain string-builder HTML rendering for service timetables.

use super::service::{ServiceReport, TripRow};
use std::fmt::Write;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn css_class_name(route: &str) -> String {
    route.replace([' ', '.'], "-")
}

/// One translucent background class per distinct route on the page.
fn route_css_classes(rows: &[TripRow]) -> String {
    let mut seen: Vec<&str> = Vec::new();
    let mut css = String::new();
    for row in rows {
        if seen.contains(&row.route_short_name.as_str()) {
            continue;
        }
        seen.push(&row.route_short_name);
        let c = &row.route_color;
        let _ = writeln!(
            css,
            "        .trip-line-{} {{ background-color: rgba({}, {}, {}, 0.30); }}",
            css_class_name(&row.route_short_name),
            c.r,
            c.g,
            c.b
        );
    }
    css
}

pub fn render_service_html(report: &ServiceReport) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n\
         <html lang=\"gl\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{name} - {date}</title>\n\
         <style>\n\
         body {{ font-family: sans-serif; margin: 2em; }}\n\
         table {{ border-collapse: collapse; width: 100%; }}\n\
         th, td {{ border: 1px solid #ccc; padding: 0.4em 0.6em; text-align: left; }}\n\
         {css}\
         </style>\n\
         </head>\n\
         <body>\n\
         <h1>{name}</h1>\n\
         <p>Date: {date}</p>\n\
         <p>Original services: {originals}</p>\n",
        name = escape(&report.service_name),
        date = report.date,
        css = route_css_classes(&report.trip_rows),
        originals = escape(&report.original_service_ids.join(", ")),
    );

    html.push_str(
        "<table>\n<thead>\n<tr>\
         <th>Line</th><th>Headsign</th>\
         <th>First stop</th><th>Departs</th>\
         <th>Last stop</th><th>Arrives</th>\
         <th>Distance (km)</th>\
         </tr>\n</thead>\n<tbody>\n",
    );
    for row in &report.trip_rows {
        let _ = write!(
            html,
            "<tr class=\"trip-line-{class}\">\
             <td>{line}</td><td>{headsign}</td>\
             <td>{first_name} ({first_code})</td><td>{first_arrival}</td>\
             <td>{last_name} ({last_code})</td><td>{last_arrival}</td>\
             <td>{distance}</td>\
             </tr>\n",
            class = css_class_name(&row.route_short_name),
            line = escape(&row.route_short_name),
            headsign = escape(&row.headsign),
            first_name = escape(&row.first_stop_name),
            first_code = escape(&row.first_stop_code),
            first_arrival = row.first_arrival,
            last_name = escape(&row.last_stop_name),
            last_code = escape(&row.last_stop_code),
            last_arrival = row.last_arrival,
            distance = row.distance,
        );
    }
    let _ = write!(
        html,
        "</tbody>\n</table>\n\
         <p>Total trips: {}, total distance: {} km</p>\n\
         </body>\n</html>\n",
        report.total_trips, report.total_distance
    );
    html
}
