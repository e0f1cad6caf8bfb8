//! Names of generated declarations.
use apollo_compiler::executable::OperationType;
use heck::ToUpperCamelCase;

use crate::configuration::EmitterOptions;
use crate::configuration::NamingConvention;

/// Converts a GraphQL name. Underscores are kept; each piece between them is cased on its own.
pub fn convert(name: &str, convention: NamingConvention) -> String {
    match convention {
        NamingConvention::Keep => name.to_owned(),
        NamingConvention::PascalCase => name
            .split('_')
            .map(|piece| piece.to_upper_camel_case())
            .collect::<Vec<_>>()
            .join("_"),
    }
}

pub fn operation_keyword(operation_type: OperationType) -> &'static str {
    match operation_type {
        OperationType::Query => "query",
        OperationType::Mutation => "mutation",
        OperationType::Subscription => "subscription",
    }
}

fn operation_suffix(operation_type: OperationType) -> &'static str {
    match operation_type {
        OperationType::Query => "Query",
        OperationType::Mutation => "Mutation",
        OperationType::Subscription => "Subscription",
    }
}

/// `GetUserQuery`, or `GetUser` with `omitOperationSuffix`.
pub fn operation_type_name(
    name: &str,
    operation_type: OperationType,
    options: &EmitterOptions,
) -> String {
    let base = convert(name, options.naming_convention);
    let suffix = operation_suffix(operation_type);
    if options.omit_operation_suffix || (options.dedupe_operation_suffix && base.ends_with(suffix))
    {
        base
    } else {
        format!("{base}{suffix}")
    }
}

pub fn variables_type_name(
    name: &str,
    operation_type: OperationType,
    options: &EmitterOptions,
) -> String {
    format!(
        "{}Variables",
        operation_type_name(name, operation_type, options)
    )
}

pub fn fragment_type_name(name: &str, convention: NamingConvention) -> String {
    format!("{}Fragment", convert(name, convention))
}

pub fn operation_document_name(name: &str, convention: NamingConvention) -> String {
    format!("{}Document", convert(name, convention))
}

pub fn fragment_document_name(name: &str, convention: NamingConvention) -> String {
    format!("{}FragmentDoc", convert(name, convention))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("getUser", "GetUser")]
    #[case("user_fields", "User_Fields")]
    #[case("URL", "Url")]
    #[case("_private", "_Private")]
    fn pascal_case_keeps_underscores(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(convert(name, NamingConvention::PascalCase), expected);
    }

    #[test]
    fn operation_suffixes() {
        let mut options = EmitterOptions::default();
        assert_eq!(
            operation_type_name("getUser", OperationType::Query, &options),
            "GetUserQuery"
        );
        assert_eq!(
            variables_type_name("AddUser", OperationType::Mutation, &options),
            "AddUserMutationVariables"
        );
        assert_eq!(
            operation_type_name("UserQuery", OperationType::Query, &options),
            "UserQueryQuery"
        );

        options.dedupe_operation_suffix = true;
        assert_eq!(
            operation_type_name("UserQuery", OperationType::Query, &options),
            "UserQuery"
        );

        options.omit_operation_suffix = true;
        assert_eq!(
            operation_type_name("OnEvent", OperationType::Subscription, &options),
            "OnEvent"
        );
    }

    #[test]
    fn document_names() {
        assert_eq!(
            operation_document_name("getUser", NamingConvention::PascalCase),
            "GetUserDocument"
        );
        assert_eq!(
            fragment_document_name("userFields", NamingConvention::Keep),
            "userFieldsFragmentDoc"
        );
        assert_eq!(
            fragment_type_name("userFields", NamingConvention::PascalCase),
            "UserFieldsFragment"
        );
    }
}
