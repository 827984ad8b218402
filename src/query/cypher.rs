// Copyright (c) 2025 - Cowboy AI, Inc.

//! Cypher rendering of compiled statements

use std::collections::BTreeSet;

use super::{
    EdgePattern, IndexTarget, MatchLinkSweep, MatchLinkUpsert, NodeSweep, NodeUpsert,
    PropertyLink, RelationshipSweep, RelationshipUpsert, Statement, SweepScope,
};
use crate::record::{BATCH_PARAMETER, LIMIT_SIZE_PARAMETER, UPDATE_TAG_PARAMETER};
use crate::schema::{
    LinkDirection, MatchMode, NodeMatcher, RelationshipProperties, FIRSTSEEN, ID, LASTUPDATED,
    SUB_RESOURCE_ID, SUB_RESOURCE_LABEL,
};

const RETURN_AFFECTED: &str = "RETURN count(*) AS affected";

pub(crate) fn render(statement: &Statement) -> String {
    match statement {
        Statement::CreateIndex(target) => render_index(target),
        Statement::UpsertNodes(upsert) => render_node_upsert(upsert),
        Statement::UpsertRelationships(upsert) => render_relationship_upsert(upsert),
        Statement::UpsertMatchLinks(upsert) => render_matchlink_upsert(upsert),
        Statement::SweepNodes(sweep) => render_node_sweep(sweep),
        Statement::SweepRelationships(sweep) => render_relationship_sweep(sweep),
        Statement::SweepMatchLinks(sweep) => render_matchlink_sweep(sweep),
        Statement::LinkByProperty(link) => render_property_link(link),
        Statement::Raw(text) => text.clone(),
    }
}

/// Names of all `$parameters` in `text`, sorted
///
/// A `$` inside a string literal or a backtick-quoted name is plain text.
pub fn referenced_parameters(text: &str) -> Vec<String> {
    let mut names = BTreeSet::new();
    let mut chars = text.char_indices();
    while let Some((pos, c)) = chars.next() {
        match c {
            '\'' | '"' | '`' => {
                while let Some((_, inner)) = chars.next() {
                    if inner == '\\' && c != '`' {
                        chars.next();
                    } else if inner == c {
                        break;
                    }
                }
            }
            '$' => {
                let rest = &text[pos + 1..];
                let end = rest
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(rest.len());
                if end > 0 {
                    names.insert(rest[..end].to_string());
                }
            }
            _ => {}
        }
    }
    names.into_iter().collect()
}

/// Comparison of `subject` against the expected `token`
pub(crate) fn predicate(subject: &str, token: &str, mode: MatchMode) -> String {
    match mode {
        MatchMode::Exact => format!("{} = {}", subject, token),
        MatchMode::CaseInsensitive => format!("toLower({}) = toLower({})", subject, token),
        MatchMode::FuzzyCaseInsensitive => {
            format!("toLower({}) CONTAINS toLower({})", subject, token)
        }
    }
}

/// Variable holding one element of a one-to-many matcher list
fn candidate_var(var: &str) -> String {
    format!("{}_candidate", var)
}

/// Predicates locating `var` by `matcher`, one per matcher property
fn matcher_predicates(var: &str, matcher: &NodeMatcher) -> Vec<String> {
    matcher
        .iter()
        .map(|(key, property)| {
            let token = if property.is_one_to_many() {
                candidate_var(var)
            } else {
                property.render()
            };
            predicate(&format!("{}.{}", var, key), &token, property.match_mode())
        })
        .collect()
}

/// `UNWIND` (for one-to-many) plus `MATCH … WHERE …` binding `var`
fn matcher_clauses(var: &str, label: &str, matcher: &NodeMatcher) -> String {
    let mut text = String::new();
    if let Some((_, property)) = matcher.one_to_many() {
        text.push_str(&format!(
            "UNWIND {} AS {}\n",
            property.render(),
            candidate_var(var)
        ));
    }
    text.push_str(&format!(
        "MATCH ({}:{})\nWHERE {}\n",
        var,
        label,
        matcher_predicates(var, matcher).join(" AND ")
    ));
    text
}

/// `(left)<-[rel]-(right)` or `(left)-[rel]->(right)`
fn relate(left: &str, rel: &str, right: &str, direction: LinkDirection) -> String {
    match direction {
        LinkDirection::Inward => format!("({})<-[{}]-({})", left, rel, right),
        LinkDirection::Outward => format!("({})-[{}]->({})", left, rel, right),
    }
}

fn stale(var: &str) -> String {
    format!(
        "({var}.{LASTUPDATED} IS NULL OR {var}.{LASTUPDATED} <> ${UPDATE_TAG_PARAMETER})",
        var = var
    )
}

fn relationship_set_clause(properties: &RelationshipProperties) -> String {
    let assignments: Vec<String> = properties
        .iter()
        .map(|(name, property)| format!("    r.{} = {}", name, property.render()))
        .collect();
    format!(
        "ON CREATE SET r.{} = timestamp()\nSET\n{}\n",
        FIRSTSEEN,
        assignments.join(",\n")
    )
}

fn render_index(target: &IndexTarget) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS FOR (n:{}) ON (n.{})",
        target.label, target.property
    )
}

fn render_node_upsert(upsert: &NodeUpsert) -> String {
    let mut assignments: Vec<String> = upsert
        .properties
        .iter()
        .filter(|(name, _)| *name != ID)
        .map(|(name, property)| format!("    i.{} = {}", name, property.render()))
        .collect();
    assignments.extend(upsert.extra_labels.iter().map(|label| format!("    i:{}", label)));

    format!(
        "UNWIND ${BATCH_PARAMETER} AS item\n\
         MERGE (i:{label} {{{ID}: {id}}})\n\
         ON CREATE SET i.{FIRSTSEEN} = timestamp()\n\
         SET\n{assignments}\n\
         {RETURN_AFFECTED}",
        label = upsert.label,
        id = upsert.properties.id().render(),
        assignments = assignments.join(",\n"),
    )
}

fn render_relationship_upsert(upsert: &RelationshipUpsert) -> String {
    let rel = &upsert.relationship;
    format!(
        "UNWIND ${BATCH_PARAMETER} AS item\n\
         MATCH (i:{node_label} {{{ID}: {id}}})\n\
         {target}\
         MERGE {pattern}\n\
         {set}\
         {RETURN_AFFECTED}",
        node_label = upsert.node_label,
        id = upsert.node_id.render(),
        target = matcher_clauses("j", rel.target_label(), rel.target_matcher()),
        pattern = relate("i", &format!("r:{}", rel.rel_label()), "j", rel.direction()),
        set = relationship_set_clause(rel.properties()),
    )
}

fn render_matchlink_upsert(upsert: &MatchLinkUpsert) -> String {
    let rel = &upsert.relationship;
    format!(
        "UNWIND ${BATCH_PARAMETER} AS item\n\
         {source}\
         {target}\
         MERGE {pattern}\n\
         {set}\
         {RETURN_AFFECTED}",
        source = matcher_clauses("i", &upsert.source_label, &upsert.source_matcher),
        target = matcher_clauses("j", rel.target_label(), rel.target_matcher()),
        pattern = relate("i", &format!("r:{}", rel.rel_label()), "j", rel.direction()),
        set = relationship_set_clause(rel.properties()),
    )
}

/// `MATCH (n:label)<-[rel_var:REL]-(s:Owner)` with the owner predicates
fn scope_match(label: &str, rel_var: &str, scope: &SweepScope) -> (String, Vec<String>) {
    let pattern = relate(
        &format!("n:{}", label),
        &format!("{}:{}", rel_var, scope.rel_label),
        &format!("s:{}", scope.owner_label),
        LinkDirection::Inward,
    );
    (
        format!("MATCH {}", pattern),
        matcher_predicates("s", &scope.owner_matcher),
    )
}

fn render_node_sweep(sweep: &NodeSweep) -> String {
    let (pattern, mut predicates) = match &sweep.scope {
        Some(scope) => scope_match(&sweep.label, "", scope),
        None => (format!("MATCH (n:{})", sweep.label), Vec::new()),
    };
    predicates.push(stale("n"));
    format!(
        "{pattern}\n\
         WHERE {predicates}\n\
         WITH DISTINCT n LIMIT ${LIMIT_SIZE_PARAMETER}\n\
         DETACH DELETE n\n\
         {RETURN_AFFECTED}",
        predicates = predicates.join(" AND "),
    )
}

fn edge_match(left: &str, edge: &EdgePattern) -> String {
    format!(
        "MATCH {}",
        relate(
            left,
            &format!("r:{}", edge.rel_label),
            &format!(":{}", edge.other_label),
            edge.direction
        )
    )
}

fn render_relationship_sweep(sweep: &RelationshipSweep) -> String {
    let body = match sweep {
        RelationshipSweep::ScopeEdge { label, scope } => {
            let (pattern, mut predicates) = scope_match(label, "r", scope);
            predicates.push(stale("r"));
            format!("{}\nWHERE {}", pattern, predicates.join(" AND "))
        }
        RelationshipSweep::Edge {
            label,
            scope: Some(scope),
            edge,
        } => {
            let (pattern, predicates) = scope_match(label, "", scope);
            format!(
                "{}\nWHERE {}\n{}\nWHERE {}",
                pattern,
                predicates.join(" AND "),
                edge_match("n", edge),
                stale("r")
            )
        }
        RelationshipSweep::Edge {
            label,
            scope: None,
            edge,
        } => format!(
            "{}\nWHERE {}",
            edge_match(&format!("n:{}", label), edge),
            stale("r")
        ),
    };
    format!(
        "{body}\n\
         WITH DISTINCT r LIMIT ${LIMIT_SIZE_PARAMETER}\n\
         DELETE r\n\
         {RETURN_AFFECTED}"
    )
}

fn render_matchlink_sweep(sweep: &MatchLinkSweep) -> String {
    format!(
        "{pattern}\n\
         WHERE {stale}\n  \
         AND r.{SUB_RESOURCE_LABEL} = {label}\n  \
         AND r.{SUB_RESOURCE_ID} = {id}\n\
         WITH r LIMIT ${LIMIT_SIZE_PARAMETER}\n\
         DELETE r\n\
         {RETURN_AFFECTED}",
        pattern = edge_match(&format!("n:{}", sweep.source_label), &sweep.edge),
        stale = stale("r"),
        label = sweep.scope_label.render(),
        id = sweep.scope_id.render(),
    )
}

fn render_property_link(link: &PropertyLink) -> String {
    format!(
        "MATCH (i:{from_label})\n\
         WHERE i.{from_property} IS NOT NULL\n\
         MATCH (j:{to_label})\n\
         WHERE {predicate}\n\
         MERGE (i)-[r:{rel_label}]->(j)\n\
         ON CREATE SET r.{FIRSTSEEN} = timestamp()\n\
         SET r.{LASTUPDATED} = ${UPDATE_TAG_PARAMETER}\n\
         {RETURN_AFFECTED}",
        from_label = link.from_label,
        from_property = link.from_property,
        to_label = link.to_label,
        rel_label = link.rel_label,
        predicate = predicate(
            &format!("j.{}", link.to_property),
            &format!("i.{}", link.from_property),
            link.match_mode
        ),
    )
}
