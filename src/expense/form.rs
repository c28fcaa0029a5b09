use maud::{Markup, html};
use time::Date;

use crate::{
    Error,
    html::{FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
    tag::TagName,
};

pub struct ExpenseFormDefaults<'a> {
    pub amount: Option<f64>,
    pub date: Date,
    pub description: Option<&'a str>,
    pub tags: &'a [TagName],
    pub max_date: Date,
    pub autofocus_amount: bool,
}

pub fn expense_form_fields(defaults: &ExpenseFormDefaults<'_>) -> Markup {
    let amount_str = defaults.amount.map(|amount| format!("{:.2}", amount.abs()));
    let amount_placeholder = amount_str.as_deref().unwrap_or("0.01");
    let description_placeholder = defaults.description.unwrap_or("Description");
    let tags_str = defaults
        .tags
        .iter()
        .map(|tag| tag.as_ref())
        .collect::<Vec<_>>()
        .join(", ");

    html! {
        div
        {
            label
                for="amount"
                class=(FORM_LABEL_STYLE)
            {
                "Amount"
            }

            input
                name="amount"
                id="amount"
                type="number"
                step="0.01"
                placeholder=(amount_placeholder)
                min="0.01"
                required
                value=[amount_str.as_deref()]
                autofocus[defaults.autofocus_amount]
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label
                for="date"
                class=(FORM_LABEL_STYLE)
            {
                "Date"
            }

            input
                name="date"
                id="date"
                type="date"
                max=(defaults.max_date)
                value=(defaults.date)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label
                for="description"
                class=(FORM_LABEL_STYLE)
            {
                "Description"
            }

            input
                name="description"
                id="description"
                type="text"
                placeholder=(description_placeholder)
                value=[defaults.description]
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label
                for="tags"
                class=(FORM_LABEL_STYLE)
            {
                "Tags (comma separated)"
            }

            input
                name="tags"
                id="tags"
                type="text"
                placeholder="groceries, food"
                value=(tags_str)
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

/// Parse a comma separated list of tag names from the expense form.
///
/// An empty or whitespace-only string produces no tags.
///
/// # Errors
///
/// This function will return [Error::EmptyTagName] if a segment between
/// commas is empty, e.g., for a trailing comma.
pub fn parse_tags(tags: &str) -> Result<Vec<TagName>, Error> {
    if tags.trim().is_empty() {
        return Ok(Vec::new());
    }

    tags.split(',').map(TagName::new).collect()
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{Error, tag::TagName};

    use super::{ExpenseFormDefaults, expense_form_fields, parse_tags};

    #[test]
    fn form_fields_include_amount_date_description_and_tags() {
        let markup = expense_form_fields(&ExpenseFormDefaults {
            amount: None,
            date: date!(2024 - 01 - 15),
            description: None,
            tags: &[],
            max_date: date!(2024 - 01 - 15),
            autofocus_amount: true,
        });
        let document = Html::parse_document(&maud::html! { form { (markup) } }.into_string());

        for (name, input_type) in [
            ("amount", "number"),
            ("date", "date"),
            ("description", "text"),
            ("tags", "text"),
        ] {
            let selector =
                Selector::parse(&format!("input[name={name}][type={input_type}]")).unwrap();
            assert!(
                document.select(&selector).next().is_some(),
                "want an input with name={name} and type={input_type}"
            );
        }
    }

    #[test]
    fn form_fields_prefill_tags_comma_separated() {
        let tags = [
            TagName::new_unchecked("groceries"),
            TagName::new_unchecked("food"),
        ];
        let markup = expense_form_fields(&ExpenseFormDefaults {
            amount: Some(12.5),
            date: date!(2024 - 01 - 15),
            description: Some("Weekly shop"),
            tags: &tags,
            max_date: date!(2024 - 01 - 15),
            autofocus_amount: false,
        });
        let document = Html::parse_document(&maud::html! { form { (markup) } }.into_string());

        let selector = Selector::parse("input[name=tags]").unwrap();
        let input = document.select(&selector).next().unwrap();
        assert_eq!(input.value().attr("value"), Some("groceries, food"));
    }

    #[test]
    fn parse_tags_splits_and_trims() {
        let tags = parse_tags(" groceries, food ").unwrap();

        assert_eq!(
            tags,
            vec![
                TagName::new_unchecked("groceries"),
                TagName::new_unchecked("food")
            ]
        );
    }

    #[test]
    fn parse_tags_returns_empty_for_blank_input() {
        assert_eq!(parse_tags("   "), Ok(Vec::new()));
    }

    #[test]
    fn parse_tags_rejects_trailing_comma() {
        assert_eq!(parse_tags("groceries,"), Err(Error::EmptyTagName));
    }
}
