//! Order notifications for the restaurant and the customer.
//!
//! Messages are rendered from the persisted order, with every line re-priced
//! through the option price resolver. Delivery runs in a detached task after
//! the order is stored; failures only reach the log.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::task::JoinHandle;

use crate::{
    catalog::{Menu, RestaurantInfo},
    email::{EmailMessage, Notifier},
    models::{OrderRecord, OrderType},
    services::{cart_service, pricing},
};

const PICKUP_ETA: &str = "Votre commande sera prête dans 30-45 minutes";

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryLine {
    pub name: String,
    pub quantity: u32,
    pub line_total: Decimal,
    pub options: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    pub lines: Vec<SummaryLine>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

/// Itemized breakdown; the stored total (charged by the provider) is the
/// reference and the subtotal is derived from it.
pub fn summarize(menu: &Menu, order: &OrderRecord) -> OrderSummary {
    let lines = order
        .items
        .iter()
        .map(|item| {
            let selected = item.selected_options.as_ref();
            let unit_price = pricing::resolve_unit_price(menu, &item.id, selected)
                .unwrap_or_else(|err| {
                    tracing::warn!(
                        item_id = %item.id,
                        error = %err,
                        "price not found, using snapshot price"
                    );
                    item.price.unwrap_or(Decimal::ZERO)
                });
            let name = item
                .name
                .clone()
                .or_else(|| menu.item(&item.id).map(|menu_item| menu_item.name.clone()))
                .unwrap_or_else(|| item.id.clone());
            SummaryLine {
                name,
                quantity: item.quantity,
                line_total: unit_price * Decimal::from(item.quantity),
                options: pricing::describe_selections(menu, &item.id, selected),
            }
        })
        .collect();

    let delivery_fee = cart_service::delivery_fee_for(menu, order.order_type);
    OrderSummary {
        lines,
        subtotal: order.total_amount - delivery_fee,
        delivery_fee,
        total: order.total_amount,
    }
}

pub fn restaurant_message(menu: &Menu, order: &OrderRecord, to: &str) -> EmailMessage {
    let summary = summarize(menu, order);
    let code = order.order_code.as_deref().unwrap_or("----");
    let email = order.customer_email.as_deref().unwrap_or("non communiqué");
    let payment = order.payment_reference.as_deref().unwrap_or("-");

    let text_lines = summary
        .lines
        .iter()
        .map(|line| {
            let options = line
                .options
                .as_ref()
                .map(|options| format!("\n  Options: {options}"))
                .unwrap_or_default();
            format!(
                "- {} x{} ({:.2}€){}",
                line.name, line.quantity, line.line_total, options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let text = format!(
        "Nouvelle commande #{code}\n\n\
         Client : {}\nEmail : {email}\nTéléphone : {}\nAdresse : {}\n\n\
         {}\n\n{text_lines}\n\nTotal : {:.2}€\n\nPaiement confirmé (ID paiement : {payment})",
        order.customer_name,
        order.customer_phone,
        order.customer_address,
        order_type_banner(order.order_type),
        summary.total,
    );

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
<h2 style="color: #ea580c;">Nouvelle commande reçue !</h2>
<p style="font-weight: bold; font-size: 24px; color: #92400e; text-align: center;">Code de commande : #{code}</p>
<h3>Informations client</h3>
<p><strong>Nom :</strong> {}</p>
<p><strong>Email :</strong> {}</p>
<p><strong>Téléphone :</strong> {}</p>
<p><strong>Adresse :</strong> {}</p>
<p style="font-weight: bold; color: #92400e;">{}</p>
<h3>Détails de la commande</h3>
<pre style="white-space: pre-wrap; font-family: monospace;">{}</pre>
<p style="font-size: 18px; font-weight: bold; color: #ea580c;">Total : {:.2}€</p>
<p style="color: #166534;">Paiement confirmé. ID paiement : {}</p>
</div>"#,
        escape_html(&order.customer_name),
        escape_html(email),
        escape_html(&order.customer_phone),
        escape_html(&order.customer_address),
        order_type_banner(order.order_type),
        escape_html(&text_lines),
        summary.total,
        escape_html(payment),
    );

    EmailMessage {
        to: to.to_string(),
        subject: format!("Nouvelle commande #{code} - {}", order.customer_name),
        text,
        html,
    }
}

/// `None` when the order carries no customer email.
pub fn customer_message(
    menu: &Menu,
    restaurant: &RestaurantInfo,
    order: &OrderRecord,
) -> Option<EmailMessage> {
    let to = order.customer_email.as_deref().filter(|email| !email.is_empty())?;
    let summary = summarize(menu, order);
    let code = order.order_code.as_deref().unwrap_or("----");
    let hand_over = match order.order_type {
        OrderType::Delivery => "Communiquez ce code au livreur",
        OrderType::Pickup => "Communiquez ce code au restaurant",
    };
    let (address_title, address) = match order.order_type {
        OrderType::Delivery => ("Adresse de livraison", order.customer_address.as_str()),
        OrderType::Pickup => ("Adresse du restaurant", restaurant.address.as_str()),
    };
    let (eta, eta_html) = match order.order_type {
        OrderType::Pickup => (
            format!("\n{PICKUP_ETA}"),
            format!("<br/><span style=\"font-weight: normal;\">{PICKUP_ETA}</span>"),
        ),
        OrderType::Delivery => (String::new(), String::new()),
    };
    let delivery_line = (summary.delivery_fee > Decimal::ZERO)
        .then(|| format!("Frais de livraison : {:.2}€\n", summary.delivery_fee))
        .unwrap_or_default();

    let text_lines = summary
        .lines
        .iter()
        .map(|line| {
            let options = line
                .options
                .as_ref()
                .map(|options| format!(" ({options})"))
                .unwrap_or_default();
            format!(
                "{} x{}{} : {:.2}€",
                line.name, line.quantity, options, line.line_total
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let text = format!(
        "Merci pour votre commande !\n\n\
         Votre code de commande : #{code}\n{hand_over}\n\n{}{eta}\n\n\
         {text_lines}\n\nSous-total : {:.2}€\n{delivery_line}Total : {:.2}€\n\n\
         {address_title} : {address}\n\n\
         Besoin d'aide ? Contactez-nous au {}.\n{}",
        order_type_banner(order.order_type),
        summary.subtotal,
        summary.total,
        restaurant.phone,
        restaurant.name,
    );

    let rows = summary
        .lines
        .iter()
        .map(|line| {
            let options = line
                .options
                .as_ref()
                .map(|options| {
                    format!(
                        r#"<br/><span style="font-size: 12px; color: #6b7280;">{}</span>"#,
                        escape_html(options)
                    )
                })
                .unwrap_or_default();
            format!(
                "<tr><td>{}{options}</td><td style=\"text-align: center;\">x{}</td><td style=\"text-align: right;\">{:.2}€</td></tr>",
                escape_html(&line.name),
                line.quantity,
                line.line_total
            )
        })
        .collect::<String>();
    let delivery_row = (summary.delivery_fee > Decimal::ZERO)
        .then(|| {
            format!(
                "<tr><td colspan=\"2\" style=\"text-align: right;\">Frais de livraison :</td><td style=\"text-align: right;\">{:.2}€</td></tr>",
                summary.delivery_fee
            )
        })
        .unwrap_or_default();

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
<h1 style="color: #ea580c;">{}</h1>
<h2>Merci pour votre commande !</h2>
<p style="color: #166534; font-weight: bold;">Paiement confirmé</p>
<div style="text-align: center; border: 2px solid #f59e0b; padding: 20px;">
<p>Votre code de commande</p>
<p style="font-weight: bold; font-size: 32px; letter-spacing: 4px;">#{code}</p>
<p style="font-size: 12px;">{hand_over}</p>
</div>
<p style="font-weight: bold; color: #92400e;">{}{eta_html}</p>
<table style="width: 100%; border-collapse: collapse;">
<thead><tr><th style="text-align: left;">Article</th><th>Qté</th><th style="text-align: right;">Prix</th></tr></thead>
<tbody>{rows}</tbody>
<tfoot>
<tr><td colspan="2" style="text-align: right; font-weight: bold;">Sous-total :</td><td style="text-align: right;">{:.2}€</td></tr>
{delivery_row}
<tr><td colspan="2" style="text-align: right; font-weight: bold; color: #ea580c;">Total :</td><td style="text-align: right; font-weight: bold; color: #ea580c;">{:.2}€</td></tr>
</tfoot>
</table>
<h4>{address_title}</h4>
<p>{}</p>
<p style="font-size: 14px;">Besoin d'aide ? Contactez-nous au {} ou répondez directement à cet email.</p>
</div>"#,
        escape_html(&restaurant.name),
        order_type_banner(order.order_type),
        summary.subtotal,
        summary.total,
        escape_html(address),
        escape_html(&restaurant.phone),
    );

    Some(EmailMessage {
        to: to.to_string(),
        subject: format!("Confirmation de votre commande #{code} - {}", restaurant.name),
        text,
        html,
    })
}

/// Sends both notifications in a detached task. Each send is independent;
/// errors are logged and never reach the caller.
pub fn spawn_order_notifications(
    menu: Arc<Menu>,
    notifier: Arc<dyn Notifier>,
    restaurant_email: String,
    order: OrderRecord,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let code = order.order_code.clone().unwrap_or_default();
        let restaurant = menu.catalog().restaurant.clone();

        let to_restaurant = restaurant_message(&menu, &order, &restaurant_email);
        if let Err(err) = notifier.send(&to_restaurant).await {
            tracing::error!(order_code = %code, error = %err, "restaurant notification failed");
        }

        match customer_message(&menu, &restaurant, &order) {
            Some(message) => {
                if let Err(err) = notifier.send(&message).await {
                    tracing::error!(
                        order_code = %code,
                        error = %err,
                        "customer notification failed"
                    );
                }
            }
            None => tracing::warn!(order_code = %code, "no customer email, confirmation skipped"),
        }
    })
}

fn order_type_banner(order_type: OrderType) -> &'static str {
    match order_type {
        OrderType::Delivery => "LIVRAISON",
        OrderType::Pickup => "À EMPORTER",
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
