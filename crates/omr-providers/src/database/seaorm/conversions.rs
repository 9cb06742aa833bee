//! Model ↔ domain conversions.
//!
//! Statuses, priorities, and type tags are stored as their wire strings;
//! a row with an unparseable tag surfaces as a database error rather than
//! silently defaulting.

use std::str::FromStr;

use omr_domain::entities::template::TemplateConfigType;
use omr_domain::entities::{
    FileOrFolder, FileStatus, FileType, MarkingConfigJob, MarkingJob, Template, TemplateConfigJob,
};
use omr_domain::error::{Error, Result};
use omr_domain::value_objects::{ClusteringParams, JobPriority, JobStatus};

use super::entities::{
    file_or_folder, marking_config_job, marking_job, template, template_config_job,
};

fn parse<T: FromStr<Err = String>>(value: &str, what: &str) -> Result<T> {
    T::from_str(value).map_err(|e| Error::database(format!("corrupt {what} column: {e}")))
}

pub fn template_to_domain(model: template::Model) -> Result<Template> {
    Ok(Template {
        id: model.id,
        name: model.name,
        description: model.description,
        config_type: parse::<TemplateConfigType>(&model.config_type, "config_type")?,
        status: parse::<JobStatus>(&model.status, "status")?,
        num_questions: model.num_questions,
        options_per_question: model.options_per_question,
        template_file_id: model.template_file_id,
        configuration_file_id: model.configuration_file_id,
        owner: model.owner,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

pub fn template_config_job_to_domain(model: template_config_job::Model) -> Result<TemplateConfigJob> {
    let clustering = match (
        model.num_of_columns,
        model.num_of_rows_per_column,
        model.num_of_options_per_question,
    ) {
        (Some(columns), Some(rows), Some(options)) => Some(ClusteringParams {
            num_of_columns: columns as u32,
            num_of_rows_per_column: rows as u32,
            num_of_options_per_question: options as u32,
        }),
        _ => None,
    };
    Ok(TemplateConfigJob {
        id: model.id,
        template_id: model.template_id,
        name: model.name,
        description: model.description,
        config_type: parse::<TemplateConfigType>(&model.config_type, "config_type")?,
        status: parse::<JobStatus>(&model.status, "status")?,
        priority: parse::<JobPriority>(&model.priority, "priority")?,
        template_path: model.template_path,
        clustering,
        save_intermediate_results: model.save_intermediate_results,
        template_config_path: model.template_config_path,
        output_image_path: model.output_image_path,
        result_image_path: model.result_image_path,
        original_image_width: model.original_image_width,
        original_image_height: model.original_image_height,
        processed_image_width: model.processed_image_width,
        processed_image_height: model.processed_image_height,
        processing_started_at: model.processing_started_at,
        processing_completed_at: model.processing_completed_at,
        error_message: model.error_message,
        owner: model.owner,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

pub fn marking_config_job_to_domain(model: marking_config_job::Model) -> Result<MarkingConfigJob> {
    Ok(MarkingConfigJob {
        id: model.id,
        template_id: model.template_id,
        name: model.name,
        status: parse::<JobStatus>(&model.status, "status")?,
        priority: parse::<JobPriority>(&model.priority, "priority")?,
        template_path: model.template_path,
        marking_scheme_path: model.marking_scheme_path,
        template_config_path: model.template_config_path,
        marking_config_path: model.marking_config_path,
        processing_started_at: model.processing_started_at,
        processing_completed_at: model.processing_completed_at,
        error_message: model.error_message,
        owner: model.owner,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

pub fn marking_job_to_domain(model: marking_job::Model) -> Result<MarkingJob> {
    Ok(MarkingJob {
        id: model.id,
        template_id: model.template_id,
        name: model.name,
        description: model.description,
        status: parse::<JobStatus>(&model.status, "status")?,
        priority: parse::<JobPriority>(&model.priority, "priority")?,
        marking_scheme_path: model.marking_scheme_path,
        answer_sheets_folder_path: model.answer_sheets_folder_path,
        output_path: model.output_path,
        intermediate_results_path: model.intermediate_results_path,
        save_intermediate_results: model.save_intermediate_results,
        total_answer_sheets: model.total_answer_sheets,
        processed_answer_sheets: model.processed_answer_sheets,
        failed_answer_sheets: model.failed_answer_sheets,
        processing_started_at: model.processing_started_at,
        processing_completed_at: model.processing_completed_at,
        error_message: model.error_message,
        results_summary: model.results_summary,
        owner: model.owner,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

pub fn file_to_domain(model: file_or_folder::Model) -> Result<FileOrFolder> {
    Ok(FileOrFolder {
        id: model.id,
        name: model.name,
        original_name: model.original_name,
        path: model.path,
        size: model.size,
        extension: model.extension,
        file_type: parse::<FileType>(&model.file_type, "file_type")?,
        status: parse::<FileStatus>(&model.status, "status")?,
        deletion_date: model.deletion_date,
        owner: model.owner,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}
