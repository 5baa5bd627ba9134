use rust_decimal::Decimal;

use crate::{
    catalog::{DELIVERY_LINE_NAME, Menu, annotation},
    models::{CartLine, MenuItem, OrderLineSnapshot, OrderType, TrustedLineItem},
    services::pricing::{self, PricingError},
};

/// Server-priced view of a client cart.
#[derive(Debug, Clone)]
pub struct ReconciledCart {
    pub line_items: Vec<TrustedLineItem>,
    pub snapshot: Vec<OrderLineSnapshot>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

/// Rebuilds trusted line items from a client cart. Every line is validated
/// before anything is priced; client-asserted prices are ignored.
pub fn reconcile(
    menu: &Menu,
    lines: &[CartLine],
    order_type: OrderType,
) -> Result<ReconciledCart, PricingError> {
    if lines.is_empty() {
        return Err(PricingError::EmptyCart);
    }
    for line in lines {
        validate_line(menu, line)?;
    }

    let mut line_items = Vec::with_capacity(lines.len() + 1);
    let mut snapshot = Vec::with_capacity(lines.len());
    let mut subtotal = Decimal::ZERO;

    for line in lines {
        let selected = line.selected_options.as_ref();
        let unit_price = pricing::resolve_unit_price(menu, &line.id, selected)?;
        let quantity = quantity_of(line)?;
        let name = menu
            .item(&line.id)
            .map(|item| item.name.clone())
            .unwrap_or_else(|| line.id.clone());

        tracing::debug!(item_id = %line.id, %unit_price, quantity, "line priced");

        subtotal += unit_price * Decimal::from(quantity);
        line_items.push(TrustedLineItem {
            name: name.clone(),
            description: pricing::describe_selections(menu, &line.id, selected),
            unit_price,
            unit_price_minor_units: pricing::to_minor_units(unit_price)?,
            quantity,
        });
        snapshot.push(OrderLineSnapshot {
            id: line.id.clone(),
            name: Some(name),
            quantity,
            selected_options: line.selected_options.clone(),
            price: Some(unit_price),
        });
    }

    let delivery_fee = delivery_fee_for(menu, order_type);
    if delivery_fee > Decimal::ZERO {
        line_items.push(TrustedLineItem {
            name: DELIVERY_LINE_NAME.to_string(),
            description: None,
            unit_price: delivery_fee,
            unit_price_minor_units: pricing::to_minor_units(delivery_fee)?,
            quantity: 1,
        });
    }

    Ok(ReconciledCart {
        line_items,
        snapshot,
        subtotal,
        delivery_fee,
        total: subtotal + delivery_fee,
    })
}

pub fn delivery_fee_for(menu: &Menu, order_type: OrderType) -> Decimal {
    match order_type {
        OrderType::Delivery => menu.rules().delivery_fee,
        OrderType::Pickup => Decimal::ZERO,
    }
}

fn validate_line(menu: &Menu, line: &CartLine) -> Result<(), PricingError> {
    let item = menu
        .item(&line.id)
        .filter(|_| menu.prices().contains(&line.id))
        .ok_or_else(|| PricingError::UnknownProduct(line.id.clone()))?;
    quantity_of(line)?;
    validate_options(item, line)
}

fn quantity_of(line: &CartLine) -> Result<u32, PricingError> {
    u32::try_from(line.quantity)
        .ok()
        .filter(|quantity| *quantity > 0)
        .ok_or_else(|| PricingError::InvalidQuantity {
            item_id: line.id.clone(),
            quantity: line.quantity,
        })
}

fn validate_options(item: &MenuItem, line: &CartLine) -> Result<(), PricingError> {
    let selected = line.selected_options.as_ref();

    for group in item.options.iter().filter(|group| group.required) {
        let chosen = selected
            .and_then(|selected| selected.get(&group.title))
            .is_some_and(|value| !value.trim().is_empty());
        if !chosen {
            return Err(PricingError::MissingOption {
                item_id: item.id.clone(),
                title: group.title.clone(),
            });
        }
    }

    for (title, value) in selected.into_iter().flatten() {
        let invalid = || PricingError::InvalidOption {
            item_id: item.id.clone(),
            title: title.clone(),
            value: value.clone(),
        };
        let choice = item
            .option_group(title)
            .and_then(|group| group.find_choice(value))
            .ok_or_else(invalid)?;
        // An annotated value must agree with the catalog's price for that choice.
        if let Some(annotated) = annotation::parse_price(value) {
            if choice.price_override != Some(annotated) {
                return Err(invalid());
            }
        }
    }

    Ok(())
}
